use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// A request to deposit `amount` of the vault's asset on behalf of `depositor`.
///
/// `amount` is denominated in the asset's smallest unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositRequest {
    pub depositor: Address,
    pub vault: Address,
    pub amount: U256,
}

/// A request to claim `amount` units of `token_id` from an ERC-1155 collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimRequest {
    pub claimer: Address,
    pub collection: Address,
    pub token_id: U256,
    pub amount: U256,
}

/// Snapshot of the on-chain values a deposit is checked against.
///
/// Fetched fresh for every validation and never cached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VaultConstraints {
    pub asset: Address,
    pub max_deposit: U256,
    pub balance: U256,
    pub allowance: U256,
}

/// Unsigned transaction produced by a successful pre-flight.
///
/// Inert until a wallet or signing client signs and broadcasts it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDescriptor {
    /// ABI-encoded call (selector || args).
    pub data: Bytes,
    pub from: Address,
    pub to: Address,
    /// Native value attached; pre-flight descriptors never transfer native currency.
    pub value: U256,
    /// Fixed conservative gas limit.
    pub gas: u64,
}

impl TransactionDescriptor {
    /// Build a descriptor for a contract call that carries no native value.
    pub fn call(from: Address, to: Address, data: impl Into<Bytes>, gas: u64) -> Self {
        Self {
            data: data.into(),
            from,
            to,
            value: U256::ZERO,
            gas,
        }
    }

    /// 4-byte function selector, if the call data is long enough to carry one.
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(0..4).map(|s| [s[0], s[1], s[2], s[3]])
    }
}
