//! Read capability implementations.
//!
//! - [`rpc::RpcReader`]: `eth_call` over any `ethers` middleware, restricted to view selectors.
//! - [`memory::InMemoryChain`]: an in-process ledger with ERC-20, ERC-4626 and ERC-1155
//!   bookkeeping, used to exercise descriptors end to end without a node.

pub mod memory;
pub mod rpc;

pub use memory::{ExecutionError, InMemoryChain};
pub use rpc::{RpcReader, TargetKind};
