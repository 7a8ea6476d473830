use alloy_primitives::{Address, FixedBytes, U256};
use async_trait::async_trait;
use thiserror::Error;

/// Errors during a read-only contract call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// Used by mocks or partially implemented readers.
    #[error("read is not implemented by this reader")]
    NotImplemented,
    /// Attempted a call whose selector is not on the read-only allowlist.
    #[error("call to {target} with selector {selector} is not allowlisted")]
    ForbiddenCall {
        target: Address,
        selector: FixedBytes<4>,
    },
    /// The underlying call or transport failed.
    #[error("call failed: {0}")]
    CallFailed(String),
    /// Return data was malformed or could not be decoded.
    #[error("malformed return data")]
    MalformedReturn,
}

/// Read-only view of an ERC-4626 vault and its underlying ERC-20 asset.
///
/// Implemented over JSON-RPC for live chains and in memory for tests.
#[async_trait]
pub trait VaultReader: Send + Sync {
    /// `IERC4626.asset()` on `vault`.
    async fn asset(&self, vault: Address) -> Result<Address, ReadError>;

    /// `IERC4626.maxDeposit(receiver)` on `vault`.
    async fn max_deposit(&self, vault: Address, receiver: Address) -> Result<U256, ReadError>;

    /// `IERC20.balanceOf(holder)` on `token`.
    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, ReadError>;

    /// `IERC20.allowance(owner, spender)` on `token`.
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ReadError>;
}

/// Read-only view of a bounded-supply ERC-1155 claim collection.
#[async_trait]
pub trait ClaimReader: Send + Sync {
    /// Per-token-id supply cap.
    async fn max_supply(&self, collection: Address) -> Result<U256, ReadError>;

    async fn total_minted(&self, collection: Address, token_id: U256) -> Result<U256, ReadError>;

    /// Raw metadata URI for `token_id` (usually `ipfs://...`).
    async fn token_uri(&self, _collection: Address, _token_id: U256) -> Result<String, ReadError> {
        Err(ReadError::NotImplemented)
    }

    /// ERC-1155 `balanceOf(holder, token_id)`.
    async fn holder_balance(
        &self,
        _collection: Address,
        _holder: Address,
        _token_id: U256,
    ) -> Result<U256, ReadError> {
        Err(ReadError::NotImplemented)
    }
}
