//! Off-chain pre-flight validation for ERC-4626 vault deposits and ERC-1155 claims.
//!
//! Validators read the relevant on-chain state through a read-only capability
//! ([`VaultReader`] / [`ClaimReader`]), reject requests that would revert, and
//! otherwise return an unsigned [`TransactionDescriptor`] for a wallet or
//! [`submit::TransactionSubmitter`] to sign and broadcast.

pub mod claim;
pub mod compat;
pub mod constants;
pub mod decoder;
pub mod deposit;
pub mod errors;
pub mod interfaces;
pub mod ipfs;
pub mod reads;
pub mod submit;

pub use preflight_types::{
    ClaimReader, ClaimRequest, DepositRequest, ReadError, TransactionDescriptor, VaultConstraints,
    VaultReader,
};

pub use claim::ClaimValidator;
pub use deposit::{validate_and_build_deposit, DepositValidator};
pub use errors::{ClaimError, DecodeError, DepositError};
