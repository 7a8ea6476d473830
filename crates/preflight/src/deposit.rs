use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use tracing::{debug, info};

use crate::{
    constants::DEPOSIT_GAS_LIMIT,
    errors::{DepositError, ReadError},
    interfaces::IERC4626,
};
use preflight_types::{DepositRequest, TransactionDescriptor, VaultConstraints, VaultReader};

/// Pre-flight validator for ERC-4626 `deposit(assets, receiver)`.
///
/// Every call reads fresh state through `R`; nothing is cached between calls.
#[derive(Clone, Debug)]
pub struct DepositValidator<R> {
    reader: R,
    gas_limit: u64,
}

impl<R: VaultReader> DepositValidator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            gas_limit: DEPOSIT_GAS_LIMIT,
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Check `request` against the vault and, if it would succeed, build the deposit call.
    ///
    /// Checks run in a fixed order and stop at the first failure:
    /// zero amount, `maxDeposit`, asset balance, allowance to the vault. The vault cap is
    /// checked before any token read since it rejects the amount regardless of funds.
    pub async fn validate_and_build(
        &self,
        request: &DepositRequest,
    ) -> Result<TransactionDescriptor, DepositError> {
        let DepositRequest {
            depositor,
            vault,
            amount,
        } = *request;

        if amount.is_zero() {
            debug!(%depositor, %vault, "rejecting zero deposit");
            return Err(DepositError::ZeroAmount);
        }

        let asset = self
            .reader
            .asset(vault)
            .await
            .inspect_err(|error| debug!(%vault, %error, "asset read failed"))?;
        debug!(%vault, %asset, "resolved vault asset");

        let max_deposit = self
            .reader
            .max_deposit(vault, depositor)
            .await
            .inspect_err(|error| debug!(%vault, %error, "maxDeposit read failed"))?;
        if amount > max_deposit {
            debug!(%depositor, %amount, %max_deposit, "amount exceeds max deposit");
            return Err(DepositError::AmountExceedsMaxDeposit {
                amount,
                max_deposit,
            });
        }

        let balance = self
            .reader
            .balance_of(asset, depositor)
            .await
            .inspect_err(|error| debug!(%asset, %depositor, %error, "balance read failed"))?;
        if balance < amount {
            debug!(%depositor, %amount, %balance, "not enough balance");
            return Err(DepositError::NotEnoughBalance { amount, balance });
        }

        let allowance = self
            .reader
            .allowance(asset, depositor, vault)
            .await
            .inspect_err(|error| debug!(%asset, %depositor, %error, "allowance read failed"))?;
        if allowance < amount {
            debug!(%depositor, %amount, %allowance, "missing allowance");
            return Err(DepositError::MissingAllowance { amount, allowance });
        }

        let tx = deposit_descriptor(depositor, vault, amount, self.gas_limit);
        info!(%depositor, %vault, %amount, gas = tx.gas, "deposit pre-flight passed");
        Ok(tx)
    }

    /// Read all four deposit constraints without applying any checks.
    pub async fn read_constraints(
        &self,
        request: &DepositRequest,
    ) -> Result<VaultConstraints, ReadError> {
        let asset = self.reader.asset(request.vault).await?;
        let max_deposit = self
            .reader
            .max_deposit(request.vault, request.depositor)
            .await?;
        let balance = self.reader.balance_of(asset, request.depositor).await?;
        let allowance = self
            .reader
            .allowance(asset, request.depositor, request.vault)
            .await?;

        Ok(VaultConstraints {
            asset,
            max_deposit,
            balance,
            allowance,
        })
    }
}

/// One-shot form of [`DepositValidator::validate_and_build`] with the default gas limit.
pub async fn validate_and_build_deposit<R: VaultReader>(
    reader: R,
    request: &DepositRequest,
) -> Result<TransactionDescriptor, DepositError> {
    DepositValidator::new(reader).validate_and_build(request).await
}

fn deposit_descriptor(
    depositor: Address,
    vault: Address,
    amount: U256,
    gas: u64,
) -> TransactionDescriptor {
    // Shares are minted to the depositor.
    let data = IERC4626::depositCall {
        assets: amount,
        receiver: depositor,
    }
    .abi_encode();
    TransactionDescriptor::call(depositor, vault, data, gas)
}
