//! Decoding of the call data carried by pre-flight descriptors.

use alloy_primitives::{Address, FixedBytes, U256};
use alloy_sol_types::SolCall;

use crate::{
    errors::DecodeError,
    interfaces::{IKiln1155, IERC4626},
};

/// A call the validators know how to build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedCall {
    Deposit { assets: U256, receiver: Address },
    Claim { token_id: U256, amount: U256 },
}

/// Decode call data produced by either validator.
pub fn decode_call(data: &[u8]) -> Result<DecodedCall, DecodeError> {
    let selector = read_selector(data)?;
    if selector == IERC4626::depositCall::SELECTOR {
        let call = decode_deposit_call(data)?;
        Ok(DecodedCall::Deposit {
            assets: call.assets,
            receiver: call.receiver,
        })
    } else if selector == IKiln1155::claimCall::SELECTOR {
        let call = decode_claim_call(data)?;
        Ok(DecodedCall::Claim {
            token_id: call.id,
            amount: call.amount,
        })
    } else {
        Err(DecodeError::UnknownSelector(FixedBytes(selector)))
    }
}

pub fn decode_deposit_call(data: &[u8]) -> Result<IERC4626::depositCall, DecodeError> {
    decode_exact::<IERC4626::depositCall>(data)
}

pub fn decode_claim_call(data: &[u8]) -> Result<IKiln1155::claimCall, DecodeError> {
    decode_exact::<IKiln1155::claimCall>(data)
}

fn decode_exact<C: SolCall>(data: &[u8]) -> Result<C, DecodeError> {
    let selector = read_selector(data)?;
    if selector != C::SELECTOR {
        return Err(DecodeError::UnknownSelector(FixedBytes(selector)));
    }
    C::abi_decode(data, true).map_err(|_| DecodeError::Malformed)
}

fn read_selector(data: &[u8]) -> Result<[u8; 4], DecodeError> {
    if data.len() < 4 {
        return Err(DecodeError::Truncated);
    }
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&data[0..4]);
    Ok(sel)
}
