use alloy_primitives::{FixedBytes, U256};
use thiserror::Error;

/// Errors during read-only calls.
pub use preflight_types::ReadError;

/// Reasons a deposit cannot currently succeed, in the order they are checked.
///
/// Domain variants are terminal: resubmitting the same request will fail the same way
/// until chain state changes. `Read` wraps transport and decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DepositError {
    #[error("Deposit amount must be greater than zero")]
    ZeroAmount,
    #[error("Amount exceeds max deposit ({amount} > {max_deposit})")]
    AmountExceedsMaxDeposit { amount: U256, max_deposit: U256 },
    #[error("Not enough balance ({balance} < {amount})")]
    NotEnoughBalance { amount: U256, balance: U256 },
    #[error("Not enough allowance ({allowance} < {amount})")]
    MissingAllowance { amount: U256, allowance: U256 },
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Reasons a claim cannot currently succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("Invalid token ID {token_id} (collection has {token_count})")]
    InvalidTokenId { token_id: U256, token_count: u64 },
    #[error("Claim amount must be greater than zero")]
    ZeroAmount,
    #[error("Max supply reached ({minted} minted + {amount} > {max_supply})")]
    MaxSupplyReached {
        minted: U256,
        amount: U256,
        max_supply: U256,
    },
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Errors during call data decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("call data shorter than a selector")]
    Truncated,
    #[error("unknown selector {0}")]
    UnknownSelector(FixedBytes<4>),
    #[error("malformed call arguments")]
    Malformed,
}
