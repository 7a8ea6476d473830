//! Signing/broadcast capability for pre-flight descriptors.

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    types::{TransactionRequest, U64},
};
use thiserror::Error;
use tracing::info;

use crate::compat::{from_h160, from_h256, to_ethers_u256, to_h160};
use preflight_types::TransactionDescriptor;

/// Errors while signing or broadcasting a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("descriptor is from {from} but the signer is {signer}")]
    SenderMismatch { from: Address, signer: Address },
    #[error("broadcast failed: {0}")]
    Broadcast(String),
    #[error("transaction {0} dropped before inclusion")]
    Dropped(B256),
    #[error("transaction reverted: {0}")]
    Reverted(String),
}

/// Something that can sign a [`TransactionDescriptor`] as its `from` account and get it mined.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Returns the transaction hash once the transaction is included.
    async fn submit(&self, tx: &TransactionDescriptor) -> Result<B256, SubmitError>;
}

/// Submitter over an `ethers` signing middleware (eg `SignerMiddleware<Provider<Http>, LocalWallet>`).
pub struct SignerSubmitter<M> {
    client: Arc<M>,
}

impl<M: Middleware> SignerSubmitter<M> {
    pub fn new(client: Arc<M>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<M: Middleware + 'static> TransactionSubmitter for SignerSubmitter<M> {
    async fn submit(&self, tx: &TransactionDescriptor) -> Result<B256, SubmitError> {
        if let Some(signer) = self.client.default_sender() {
            let signer = from_h160(signer);
            if signer != tx.from {
                return Err(SubmitError::SenderMismatch {
                    from: tx.from,
                    signer,
                });
            }
        }

        let request = TransactionRequest::new()
            .from(to_h160(tx.from))
            .to(to_h160(tx.to))
            .data(tx.data.to_vec())
            .value(to_ethers_u256(tx.value))
            .gas(tx.gas);

        let pending = self
            .client
            .send_transaction(request, None)
            .await
            .map_err(|e| SubmitError::Broadcast(e.to_string()))?;
        let hash = from_h256(pending.tx_hash());
        info!(%hash, to = %tx.to, "transaction broadcast");

        let receipt = pending
            .await
            .map_err(|e| SubmitError::Broadcast(e.to_string()))?
            .ok_or(SubmitError::Dropped(hash))?;
        if receipt.status == Some(U64::zero()) {
            return Err(SubmitError::Reverted(format!("{hash}")));
        }
        Ok(hash)
    }
}
