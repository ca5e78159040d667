//! Ledger capability and token operations.

use std::sync::Arc;

use serde_json::Value;

use super::amount::validate_raw_amount;
use super::{
    ContractCall, LedgerError, LedgerMethod, RetryPolicy, TokenBalance, TokenBurnParams, TokenInfo,
    TokenMintParams, TokenTransferParams, TransactionResult, TransactionStatus, TOKEN_DECIMALS,
};

/// Access to the token contract.
///
/// Implementations own transport, signing and contract addressing.
pub trait LedgerClient: Send + Sync {
    /// Simulate a read-only call and return the contract's return value.
    fn call(
        &self,
        call: &ContractCall,
    ) -> impl std::future::Future<Output = Result<Option<Value>, LedgerError>> + Send;

    /// Sign and submit a state-changing call, returning the transaction hash.
    fn submit(
        &self,
        signer: &str,
        call: &ContractCall,
    ) -> impl std::future::Future<Output = Result<String, LedgerError>> + Send;

    /// Look up a submitted transaction.
    fn transaction_status(
        &self,
        hash: &str,
    ) -> impl std::future::Future<Output = Result<TransactionStatus, LedgerError>> + Send;
}

/// Loyalty point operations over a [`LedgerClient`].
pub struct TokenOperations<L> {
    client: Arc<L>,
    retry: RetryPolicy,
}

impl<L> Clone for TokenOperations<L> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            retry: self.retry.clone(),
        }
    }
}

impl<L: LedgerClient> TokenOperations<L> {
    /// Create token operations with the default retry policy.
    pub fn new(client: Arc<L>) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn client(&self) -> &Arc<L> {
        &self.client
    }

    /// Award points. Signed by the contract admin.
    pub async fn mint(&self, admin: &str, params: &TokenMintParams) -> TransactionResult {
        if let Err(e) = validate_raw_amount(&params.amount) {
            return TransactionResult::failed(None, LedgerError::from(e).to_string());
        }
        let call = ContractCall::new(
            LedgerMethod::Mint,
            vec![params.to.clone(), params.amount.clone()],
        );
        self.execute(admin, call).await
    }

    /// Redeem points. Signed by the holder.
    pub async fn burn(&self, params: &TokenBurnParams) -> TransactionResult {
        if let Err(e) = validate_raw_amount(&params.amount) {
            return TransactionResult::failed(None, LedgerError::from(e).to_string());
        }
        let call = ContractCall::new(
            LedgerMethod::Burn,
            vec![params.from.clone(), params.amount.clone()],
        );
        self.execute(&params.from, call).await
    }

    /// Move points between holders. Signed by the sender.
    pub async fn transfer(&self, params: &TokenTransferParams) -> TransactionResult {
        if let Err(e) = validate_raw_amount(&params.amount) {
            return TransactionResult::failed(None, LedgerError::from(e).to_string());
        }
        let call = ContractCall::new(
            LedgerMethod::Transfer,
            vec![
                params.from.clone(),
                params.to.clone(),
                params.amount.clone(),
            ],
        );
        self.execute(&params.from, call).await
    }

    /// Allow `spender` to move up to `amount` of the owner's points.
    pub async fn approve(&self, owner: &str, spender: &str, amount: &str) -> TransactionResult {
        if let Err(e) = validate_raw_amount(amount) {
            return TransactionResult::failed(None, LedgerError::from(e).to_string());
        }
        let call = ContractCall::new(
            LedgerMethod::Approve,
            vec![owner.to_string(), spender.to_string(), amount.to_string()],
        );
        self.execute(owner, call).await
    }

    /// Balance of an address, or zero if the ledger cannot be reached.
    pub async fn balance(&self, address: &str) -> TokenBalance {
        match self.try_balance(address).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!("Balance lookup for {} failed: {}", address, e);
                TokenBalance::zero()
            }
        }
    }

    /// Balance of an address.
    pub async fn try_balance(&self, address: &str) -> Result<TokenBalance, LedgerError> {
        let call = ContractCall::new(LedgerMethod::Balance, vec![address.to_string()]);
        let value = self.client.call(&call).await?;
        Ok(TokenBalance::new(
            value_as_string(value.as_ref()).unwrap_or_else(|| "0".to_string()),
        ))
    }

    /// Token metadata. Each field falls back to its default independently.
    pub async fn token_info(&self) -> TokenInfo {
        let name_call = ContractCall::no_args(LedgerMethod::Name);
        let symbol_call = ContractCall::no_args(LedgerMethod::Symbol);
        let decimals_call = ContractCall::no_args(LedgerMethod::Decimals);
        let supply_call = ContractCall::no_args(LedgerMethod::TotalSupply);

        let (name, symbol, decimals, supply) = futures::join!(
            self.read(&name_call),
            self.read(&symbol_call),
            self.read(&decimals_call),
            self.read(&supply_call),
        );

        let defaults = TokenInfo::default();
        TokenInfo {
            name: value_as_string(name.as_ref()).unwrap_or(defaults.name),
            symbol: value_as_string(symbol.as_ref()).unwrap_or(defaults.symbol),
            decimals: decimals
                .as_ref()
                .and_then(value_as_u32)
                .unwrap_or(TOKEN_DECIMALS),
            total_supply: value_as_string(supply.as_ref()).unwrap_or(defaults.total_supply),
        }
    }

    /// Remaining allowance, or zero if the ledger cannot be reached.
    pub async fn allowance(&self, owner: &str, spender: &str) -> String {
        let call = ContractCall::new(
            LedgerMethod::Allowance,
            vec![owner.to_string(), spender.to_string()],
        );
        value_as_string(self.read(&call).await.as_ref()).unwrap_or_else(|| "0".to_string())
    }

    async fn read(&self, call: &ContractCall) -> Option<Value> {
        match self.client.call(call).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Read of {} failed: {}", call.method, e);
                None
            }
        }
    }

    async fn execute(&self, signer: &str, call: ContractCall) -> TransactionResult {
        let hash = match self.client.submit(signer, &call).await {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!("Submitting {} failed: {}", call.method, e);
                return TransactionResult::failed(None, e.to_string());
            }
        };
        tracing::debug!("Submitted {} as {}", call.method, hash);

        match self.await_confirmation(&hash).await {
            Ok(TransactionStatus::Success(result)) => {
                tracing::info!("{} confirmed: {}", call.method, hash);
                TransactionResult::succeeded(hash, result)
            }
            Ok(TransactionStatus::Failed(reason)) => {
                tracing::warn!("{} rejected: {} ({})", call.method, hash, reason);
                TransactionResult::failed(Some(hash), reason)
            }
            Ok(TransactionStatus::NotFound) => {
                TransactionResult::failed(Some(hash), "Transaction not found")
            }
            Err(e) => {
                tracing::warn!("{} unconfirmed: {}", call.method, e);
                TransactionResult::failed(Some(hash), e.to_string())
            }
        }
    }

    /// Poll until the transaction leaves `NotFound`, within the retry policy.
    pub async fn await_confirmation(&self, hash: &str) -> Result<TransactionStatus, LedgerError> {
        let attempts = self.retry.max_attempts.max(1);
        let timed_out = || LedgerError::ConfirmationTimeout {
            hash: hash.to_string(),
            attempts,
        };

        let poll = async {
            for attempt in 0..attempts {
                match self.client.transaction_status(hash).await {
                    Ok(TransactionStatus::NotFound) => {}
                    Ok(status) => return Ok(status),
                    Err(e) if e.is_transient() => {
                        tracing::debug!("Status poll {} for {} failed: {}", attempt + 1, hash, e);
                    }
                    Err(e) => return Err(e),
                }

                if attempt + 1 < attempts {
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                }
            }
            Err(timed_out())
        };

        match tokio::time::timeout(self.retry.timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(timed_out()),
        }
    }
}

fn value_as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
