use std::{collections::HashMap, sync::Arc};

use alloy_primitives::{keccak256, Address, B256, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::{
    decoder::{decode_call, DecodedCall},
    errors::DecodeError,
    submit::{SubmitError, TransactionSubmitter},
};
use preflight_types::{ClaimReader, ReadError, TransactionDescriptor, VaultReader};

/// Why an in-memory transaction did not apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("no contract at {0}")]
    NoContract(Address),
    #[error("execution reverted: {0}")]
    Reverted(&'static str),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Default)]
struct Erc20 {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

impl Erc20 {
    fn balance(&self, holder: Address) -> U256 {
        self.balances.get(&holder).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ExecutionError> {
        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(ExecutionError::Reverted("ERC20InsufficientAllowance"));
        }
        let balance = self.balance(from);
        if balance < amount {
            return Err(ExecutionError::Reverted("ERC20InsufficientBalance"));
        }
        // Infinite approvals are not decremented.
        if allowance != U256::MAX {
            self.allowances.insert((from, spender), allowance - amount);
        }
        self.balances.insert(from, balance - amount);
        *self.balances.entry(to).or_default() += amount;
        Ok(())
    }
}

struct Vault {
    asset: Address,
    max_deposit: U256,
    shares: HashMap<Address, U256>,
    total_supply: U256,
}

struct Collection {
    base_uri: String,
    token_count: u64,
    max_supply: U256,
    minted: HashMap<U256, U256>,
    balances: HashMap<(Address, U256), U256>,
}

#[derive(Default)]
struct ChainState {
    tokens: HashMap<Address, Erc20>,
    vaults: HashMap<Address, Vault>,
    collections: HashMap<Address, Collection>,
    nonce: u64,
}

/// Shared in-process ledger implementing the read and submit capabilities.
///
/// Clones share state, so a validator can own one clone while a test mutates and
/// inspects another. Vault share math follows ERC-4626 without a virtual offset:
/// the first deposit mints shares 1:1, later ones `assets * supply / total_assets`.
#[derive(Clone, Default)]
pub struct InMemoryChain {
    state: Arc<Mutex<ChainState>>,
}

impl InMemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deploy_token(&self, token: Address) {
        self.state.lock().tokens.entry(token).or_default();
    }

    /// Deploy a vault over `asset` with no deposit cap.
    pub fn deploy_vault(&self, vault: Address, asset: Address) {
        self.state.lock().vaults.insert(
            vault,
            Vault {
                asset,
                max_deposit: U256::MAX,
                shares: HashMap::new(),
                total_supply: U256::ZERO,
            },
        );
    }

    pub fn deploy_collection(
        &self,
        collection: Address,
        base_uri: impl Into<String>,
        token_count: u64,
        max_supply: U256,
    ) {
        self.state.lock().collections.insert(
            collection,
            Collection {
                base_uri: base_uri.into(),
                token_count,
                max_supply,
                minted: HashMap::new(),
                balances: HashMap::new(),
            },
        );
    }

    pub fn set_max_deposit(&self, vault: Address, max_deposit: U256) -> Result<(), ExecutionError> {
        let mut state = self.state.lock();
        let vault_state = state
            .vaults
            .get_mut(&vault)
            .ok_or(ExecutionError::NoContract(vault))?;
        vault_state.max_deposit = max_deposit;
        Ok(())
    }

    pub fn mint(&self, token: Address, to: Address, amount: U256) -> Result<(), ExecutionError> {
        let mut state = self.state.lock();
        let erc20 = state
            .tokens
            .get_mut(&token)
            .ok_or(ExecutionError::NoContract(token))?;
        *erc20.balances.entry(to).or_default() += amount;
        Ok(())
    }

    pub fn transfer(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ExecutionError> {
        let mut state = self.state.lock();
        let erc20 = state
            .tokens
            .get_mut(&token)
            .ok_or(ExecutionError::NoContract(token))?;
        let balance = erc20.balance(from);
        if balance < amount {
            return Err(ExecutionError::Reverted("ERC20InsufficientBalance"));
        }
        erc20.balances.insert(from, balance - amount);
        *erc20.balances.entry(to).or_default() += amount;
        Ok(())
    }

    /// Set (not add to) `owner`'s allowance for `spender`.
    pub fn approve(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), ExecutionError> {
        let mut state = self.state.lock();
        let erc20 = state
            .tokens
            .get_mut(&token)
            .ok_or(ExecutionError::NoContract(token))?;
        erc20.allowances.insert((owner, spender), amount);
        Ok(())
    }

    pub fn token_balance(&self, token: Address, holder: Address) -> U256 {
        let state = self.state.lock();
        state
            .tokens
            .get(&token)
            .map(|t| t.balance(holder))
            .unwrap_or_default()
    }

    pub fn share_balance(&self, vault: Address, holder: Address) -> U256 {
        let state = self.state.lock();
        state
            .vaults
            .get(&vault)
            .and_then(|v| v.shares.get(&holder).copied())
            .unwrap_or_default()
    }

    pub fn total_shares(&self, vault: Address) -> U256 {
        let state = self.state.lock();
        state
            .vaults
            .get(&vault)
            .map(|v| v.total_supply)
            .unwrap_or_default()
    }

    pub fn collection_balance(&self, collection: Address, holder: Address, token_id: U256) -> U256 {
        let state = self.state.lock();
        state
            .collections
            .get(&collection)
            .and_then(|c| c.balances.get(&(holder, token_id)).copied())
            .unwrap_or_default()
    }

    /// Apply a descriptor as if it had been signed by `tx.from` and mined.
    ///
    /// Execution is atomic: a revert leaves state untouched.
    pub fn execute(&self, tx: &TransactionDescriptor) -> Result<B256, ExecutionError> {
        let call = decode_call(&tx.data)?;
        let mut state = self.state.lock();

        match call {
            DecodedCall::Deposit { assets, receiver } => {
                apply_deposit(&mut state, tx.from, tx.to, assets, receiver)?
            }
            DecodedCall::Claim { token_id, amount } => {
                apply_claim(&mut state, tx.from, tx.to, token_id, amount)?
            }
        }

        state.nonce += 1;
        let mut preimage = Vec::with_capacity(8 + 20 + tx.data.len());
        preimage.extend_from_slice(&state.nonce.to_be_bytes());
        preimage.extend_from_slice(tx.from.as_slice());
        preimage.extend_from_slice(&tx.data);
        Ok(keccak256(preimage))
    }
}

fn apply_deposit(
    state: &mut ChainState,
    caller: Address,
    vault: Address,
    assets: U256,
    receiver: Address,
) -> Result<(), ExecutionError> {
    let ChainState { tokens, vaults, .. } = state;
    let vault_state = vaults
        .get_mut(&vault)
        .ok_or(ExecutionError::NoContract(vault))?;
    if assets > vault_state.max_deposit {
        return Err(ExecutionError::Reverted("ERC4626ExceededMaxDeposit"));
    }
    let asset = tokens
        .get_mut(&vault_state.asset)
        .ok_or(ExecutionError::NoContract(vault_state.asset))?;

    let total_assets = asset.balance(vault);
    let shares = if vault_state.total_supply.is_zero() || total_assets.is_zero() {
        assets
    } else {
        assets
            .checked_mul(vault_state.total_supply)
            .ok_or(ExecutionError::Reverted("arithmetic overflow"))?
            / total_assets
    };

    asset.transfer_from(vault, caller, vault, assets)?;
    *vault_state.shares.entry(receiver).or_default() += shares;
    vault_state.total_supply += shares;
    debug!(%vault, %receiver, %assets, %shares, "applied deposit");
    Ok(())
}

fn apply_claim(
    state: &mut ChainState,
    caller: Address,
    collection: Address,
    token_id: U256,
    amount: U256,
) -> Result<(), ExecutionError> {
    let coll = state
        .collections
        .get_mut(&collection)
        .ok_or(ExecutionError::NoContract(collection))?;
    if token_id >= U256::from(coll.token_count) {
        return Err(ExecutionError::Reverted("Invalid token ID"));
    }
    let minted = coll.minted.get(&token_id).copied().unwrap_or_default();
    let minted = minted
        .checked_add(amount)
        .ok_or(ExecutionError::Reverted("arithmetic overflow"))?;
    if minted > coll.max_supply {
        return Err(ExecutionError::Reverted("Max supply reached"));
    }
    let balance = coll.balances.get(&(caller, token_id)).copied().unwrap_or_default();
    let balance = balance
        .checked_add(amount)
        .ok_or(ExecutionError::Reverted("arithmetic overflow"))?;
    coll.minted.insert(token_id, minted);
    coll.balances.insert((caller, token_id), balance);
    Ok(())
}

fn no_contract(address: Address) -> ReadError {
    ReadError::CallFailed(format!("no contract at {address}"))
}

#[async_trait]
impl VaultReader for InMemoryChain {
    async fn asset(&self, vault: Address) -> Result<Address, ReadError> {
        let state = self.state.lock();
        state
            .vaults
            .get(&vault)
            .map(|v| v.asset)
            .ok_or_else(|| no_contract(vault))
    }

    async fn max_deposit(&self, vault: Address, _receiver: Address) -> Result<U256, ReadError> {
        let state = self.state.lock();
        state
            .vaults
            .get(&vault)
            .map(|v| v.max_deposit)
            .ok_or_else(|| no_contract(vault))
    }

    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, ReadError> {
        let state = self.state.lock();
        state
            .tokens
            .get(&token)
            .map(|t| t.balance(holder))
            .ok_or_else(|| no_contract(token))
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ReadError> {
        let state = self.state.lock();
        state
            .tokens
            .get(&token)
            .map(|t| t.allowance(owner, spender))
            .ok_or_else(|| no_contract(token))
    }
}

#[async_trait]
impl ClaimReader for InMemoryChain {
    async fn max_supply(&self, collection: Address) -> Result<U256, ReadError> {
        let state = self.state.lock();
        state
            .collections
            .get(&collection)
            .map(|c| c.max_supply)
            .ok_or_else(|| no_contract(collection))
    }

    async fn total_minted(&self, collection: Address, token_id: U256) -> Result<U256, ReadError> {
        let state = self.state.lock();
        state
            .collections
            .get(&collection)
            .map(|c| c.minted.get(&token_id).copied().unwrap_or_default())
            .ok_or_else(|| no_contract(collection))
    }

    async fn token_uri(&self, collection: Address, token_id: U256) -> Result<String, ReadError> {
        let state = self.state.lock();
        state
            .collections
            .get(&collection)
            .map(|c| format!("{}{}.json", c.base_uri, token_id))
            .ok_or_else(|| no_contract(collection))
    }

    async fn holder_balance(
        &self,
        collection: Address,
        holder: Address,
        token_id: U256,
    ) -> Result<U256, ReadError> {
        let state = self.state.lock();
        state
            .collections
            .get(&collection)
            .map(|c| c.balances.get(&(holder, token_id)).copied().unwrap_or_default())
            .ok_or_else(|| no_contract(collection))
    }
}

#[async_trait]
impl TransactionSubmitter for InMemoryChain {
    async fn submit(&self, tx: &TransactionDescriptor) -> Result<B256, SubmitError> {
        self.execute(tx)
            .map_err(|e| SubmitError::Reverted(e.to_string()))
    }
}
