use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use tracing::{debug, info};

use crate::{
    constants::{CLAIM_GAS_LIMIT, DEFAULT_IPFS_GATEWAY, DEFAULT_TOKEN_COUNT},
    errors::{ClaimError, ReadError},
    interfaces::IKiln1155,
    ipfs::resolve_ipfs_url,
};
use preflight_types::{ClaimReader, ClaimRequest, TransactionDescriptor};

/// Pre-flight validator for `claim(id, amount)` on a bounded-supply ERC-1155 collection.
#[derive(Clone, Debug)]
pub struct ClaimValidator<R> {
    reader: R,
    token_count: u64,
    gas_limit: u64,
    gateway: String,
}

impl<R: ClaimReader> ClaimValidator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            token_count: DEFAULT_TOKEN_COUNT,
            gas_limit: CLAIM_GAS_LIMIT,
            gateway: DEFAULT_IPFS_GATEWAY.to_string(),
        }
    }

    /// Valid token ids are `0..token_count`.
    pub fn with_token_count(mut self, token_count: u64) -> Self {
        self.token_count = token_count;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = gateway.into();
        self
    }

    /// Check that `request` can be minted and build the claim call.
    ///
    /// Order: token id range, non-zero amount, remaining supply for the id.
    pub async fn validate_and_build(
        &self,
        request: &ClaimRequest,
    ) -> Result<TransactionDescriptor, ClaimError> {
        let ClaimRequest {
            claimer,
            collection,
            token_id,
            amount,
        } = *request;

        if token_id >= U256::from(self.token_count) {
            debug!(%collection, %token_id, token_count = self.token_count, "invalid token id");
            return Err(ClaimError::InvalidTokenId {
                token_id,
                token_count: self.token_count,
            });
        }
        if amount.is_zero() {
            debug!(%claimer, %collection, %token_id, "rejecting zero claim");
            return Err(ClaimError::ZeroAmount);
        }

        let max_supply = self
            .reader
            .max_supply(collection)
            .await
            .inspect_err(|error| debug!(%collection, %error, "MAX_SUPPLY read failed"))?;
        let minted = self
            .reader
            .total_minted(collection, token_id)
            .await
            .inspect_err(|error| debug!(%collection, %token_id, %error, "totalMinted read failed"))?;
        // minted + amount > max_supply, without overflowing on huge amounts
        if minted > max_supply || amount > max_supply - minted {
            debug!(%collection, %token_id, %minted, %amount, %max_supply, "max supply reached");
            return Err(ClaimError::MaxSupplyReached {
                minted,
                amount,
                max_supply,
            });
        }

        let data = IKiln1155::claimCall {
            id: token_id,
            amount,
        }
        .abi_encode();
        info!(%claimer, %collection, %token_id, %amount, "claim pre-flight passed");
        Ok(TransactionDescriptor::call(
            claimer,
            collection,
            data,
            self.gas_limit,
        ))
    }

    /// Read `uri(token_id)` and resolve it to a fetchable gateway URL.
    pub async fn metadata_url(
        &self,
        collection: Address,
        token_id: U256,
    ) -> Result<Option<String>, ReadError> {
        let uri = self
            .reader
            .token_uri(collection, token_id)
            .await
            .inspect_err(|error| debug!(%collection, %token_id, %error, "uri read failed"))?;
        Ok(resolve_ipfs_url(&uri, &self.gateway))
    }

    /// How many of `token_id` the `holder` already owns.
    pub async fn holder_balance(
        &self,
        collection: Address,
        holder: Address,
        token_id: U256,
    ) -> Result<U256, ReadError> {
        self.reader
            .holder_balance(collection, holder, token_id)
            .await
            .inspect_err(|error| debug!(%collection, %holder, %error, "balanceOf read failed"))
    }
}
