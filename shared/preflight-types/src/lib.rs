//! Shared types for deposit/claim requests, transaction descriptors, and read capabilities.

pub mod descriptors;
pub mod reads;

pub use descriptors::{ClaimRequest, DepositRequest, TransactionDescriptor, VaultConstraints};
pub use reads::{ClaimReader, ReadError, VaultReader};
