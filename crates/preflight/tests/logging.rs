use std::{io, sync::Arc};

use alloy_primitives::{Address, U256};
use parking_lot::Mutex;
use preflight::{
    reads::InMemoryChain, ClaimError, ClaimRequest, ClaimValidator, DepositError, DepositRequest,
    DepositValidator,
};
use tracing::Level;

const MISSING: Address = Address::new([0xee; 20]);
const COLLECTION: Address = Address::new([0xc1; 20]);
const USER: Address = Address::new([0x0b; 20]);

/// Collects formatted events so assertions can look at what was logged.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.0.lock());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// Single test so the thread-local subscriber never competes with another test.
#[tokio::test]
async fn rejections_and_read_failures_are_logged_at_debug() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let chain = InMemoryChain::new();
    chain.deploy_collection(COLLECTION, "ipfs://base/", 5, U256::from(1_000u64));

    let err = DepositValidator::new(chain.clone())
        .validate_and_build(&DepositRequest {
            depositor: USER,
            vault: MISSING,
            amount: U256::from(1u64),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DepositError::Read(_)));
    let out = logs.take();
    assert!(out.contains("DEBUG"), "{out}");
    assert!(out.contains("asset read failed"), "{out}");

    let validator = ClaimValidator::new(chain.clone());
    let err = validator
        .validate_and_build(&ClaimRequest {
            claimer: USER,
            collection: COLLECTION,
            token_id: U256::ZERO,
            amount: U256::ZERO,
        })
        .await
        .unwrap_err();
    assert_eq!(err, ClaimError::ZeroAmount);
    assert!(logs.take().contains("rejecting zero claim"));

    let err = validator
        .validate_and_build(&ClaimRequest {
            claimer: USER,
            collection: MISSING,
            token_id: U256::ZERO,
            amount: U256::from(1u64),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClaimError::Read(_)));
    assert!(logs.take().contains("MAX_SUPPLY read failed"));
}
