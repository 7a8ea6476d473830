use std::{collections::BTreeSet, sync::Arc};

use alloy_primitives::{Address, FixedBytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    types::{transaction::eip2718::TypedTransaction, TransactionRequest},
};
use tracing::debug;

use crate::{
    compat::to_h160,
    interfaces::{IKiln1155, IERC20, IERC4626},
};
use preflight_types::{ClaimReader, ReadError, VaultReader};

/// The role of the contract a view is issued against.
///
/// Vault and asset addresses are only known per request, so the allowlist is keyed on the
/// role rather than on a fixed address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TargetKind {
    Vault,
    Asset,
    Collection,
}

/// Reader that issues `eth_call`s through an `ethers` middleware.
///
/// Only `(target kind, selector)` pairs on the allowlist are ever sent, so a reader can not
/// be used to simulate state-changing calls by accident.
pub struct RpcReader<M> {
    client: Arc<M>,
    allowlist: BTreeSet<(TargetKind, [u8; 4])>,
}

impl<M> Clone for RpcReader<M> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            allowlist: self.allowlist.clone(),
        }
    }
}

impl<M: Middleware> RpcReader<M> {
    pub fn new(client: Arc<M>) -> Self {
        let mut allowlist = BTreeSet::new();

        // IERC4626 views
        allowlist.insert((TargetKind::Vault, IERC4626::assetCall::SELECTOR));
        allowlist.insert((TargetKind::Vault, IERC4626::maxDepositCall::SELECTOR));
        // IERC20 views
        allowlist.insert((TargetKind::Asset, IERC20::balanceOfCall::SELECTOR));
        allowlist.insert((TargetKind::Asset, IERC20::allowanceCall::SELECTOR));
        // IKiln1155 views
        allowlist.insert((TargetKind::Collection, IKiln1155::MAX_SUPPLYCall::SELECTOR));
        allowlist.insert((TargetKind::Collection, IKiln1155::totalMintedCall::SELECTOR));
        allowlist.insert((TargetKind::Collection, IKiln1155::uriCall::SELECTOR));
        allowlist.insert((TargetKind::Collection, IKiln1155::balanceOfCall::SELECTOR));

        Self { client, allowlist }
    }

    /// `eth_call` an allowlisted view on `target` and decode its return data.
    pub async fn call_view<C>(
        &self,
        kind: TargetKind,
        target: Address,
        call: &C,
    ) -> Result<C::Return, ReadError>
    where
        C: SolCall + Sync,
    {
        let selector = FixedBytes(C::SELECTOR);
        if !self.allowlist.contains(&(kind, C::SELECTOR)) {
            debug!(?kind, %target, %selector, "refusing non-allowlisted call");
            return Err(ReadError::ForbiddenCall { target, selector });
        }

        let tx: TypedTransaction = TransactionRequest::new()
            .to(to_h160(target))
            .data(call.abi_encode())
            .into();
        debug!(?kind, %target, %selector, "eth_call");

        let out = self
            .client
            .call(&tx, None)
            .await
            .map_err(|e| ReadError::CallFailed(e.to_string()))?;
        C::abi_decode_returns(out.as_ref(), true).map_err(|_| ReadError::MalformedReturn)
    }
}

#[async_trait]
impl<M: Middleware + 'static> VaultReader for RpcReader<M> {
    async fn asset(&self, vault: Address) -> Result<Address, ReadError> {
        let ret = self
            .call_view(TargetKind::Vault, vault, &IERC4626::assetCall {})
            .await?;
        Ok(ret._0)
    }

    async fn max_deposit(&self, vault: Address, receiver: Address) -> Result<U256, ReadError> {
        let ret = self
            .call_view(TargetKind::Vault, vault, &IERC4626::maxDepositCall { receiver })
            .await?;
        Ok(ret._0)
    }

    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, ReadError> {
        let ret = self
            .call_view(TargetKind::Asset, token, &IERC20::balanceOfCall { account: holder })
            .await?;
        Ok(ret._0)
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ReadError> {
        let ret = self
            .call_view(TargetKind::Asset, token, &IERC20::allowanceCall { owner, spender })
            .await?;
        Ok(ret._0)
    }
}

#[async_trait]
impl<M: Middleware + 'static> ClaimReader for RpcReader<M> {
    async fn max_supply(&self, collection: Address) -> Result<U256, ReadError> {
        let ret = self
            .call_view(TargetKind::Collection, collection, &IKiln1155::MAX_SUPPLYCall {})
            .await?;
        Ok(ret._0)
    }

    async fn total_minted(&self, collection: Address, token_id: U256) -> Result<U256, ReadError> {
        let ret = self
            .call_view(
                TargetKind::Collection,
                collection,
                &IKiln1155::totalMintedCall { id: token_id },
            )
            .await?;
        Ok(ret._0)
    }

    async fn token_uri(&self, collection: Address, token_id: U256) -> Result<String, ReadError> {
        let ret = self
            .call_view(TargetKind::Collection, collection, &IKiln1155::uriCall { id: token_id })
            .await?;
        Ok(ret._0)
    }

    async fn holder_balance(
        &self,
        collection: Address,
        holder: Address,
        token_id: U256,
    ) -> Result<U256, ReadError> {
        let ret = self
            .call_view(
                TargetKind::Collection,
                collection,
                &IKiln1155::balanceOfCall {
                    account: holder,
                    id: token_id,
                },
            )
            .await?;
        Ok(ret._0)
    }
}
