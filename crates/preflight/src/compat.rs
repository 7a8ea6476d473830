//! Conversions between alloy primitives and the `ethers` types used on the RPC boundary.

use alloy_primitives::{Address, B256, U256};
use ethers::types::{H160, H256, U256 as EthersU256};

pub fn to_h160(address: Address) -> H160 {
    H160::from_slice(address.as_slice())
}

pub fn from_h160(address: H160) -> Address {
    Address::from_slice(address.as_bytes())
}

pub fn to_ethers_u256(value: U256) -> EthersU256 {
    EthersU256::from_big_endian(&value.to_be_bytes::<32>())
}

pub fn from_h256(hash: H256) -> B256 {
    B256::from(hash.0)
}
