//! Defaults shared by the validators and tooling.

/// Conservative gas limit attached to deposit descriptors.
pub const DEPOSIT_GAS_LIMIT: u64 = 200_000;

/// Conservative gas limit attached to claim descriptors.
pub const CLAIM_GAS_LIMIT: u64 = 150_000;

/// Number of claimable token ids (`0..DEFAULT_TOKEN_COUNT`) in the reference collection.
pub const DEFAULT_TOKEN_COUNT: u64 = 5;

pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";
