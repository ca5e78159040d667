//! Loyalty token ledger facade.
//!
//! The remote token contract is reached through the [`LedgerClient`]
//! capability; nothing in this crate depends on a particular blockchain SDK.
//! [`TokenOperations`] layers the loyalty-point operations (mint, burn,
//! transfer, balance) on top of it.

pub mod amount;
pub mod client;
pub mod network;
pub mod retry;
pub mod sequence;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export main types
pub use amount::{format_token_amount, parse_token_amount, AmountError};
pub use client::{LedgerClient, TokenOperations};
pub use network::{is_valid_contract_address, Network, NetworkConfig};
pub use retry::RetryPolicy;
pub use sequence::{BalanceTracker, RequestTicket};

/// Symbol of the loyalty points token.
pub const TOKEN_SYMBOL: &str = "PTS";

/// Display name of the loyalty points token.
pub const TOKEN_NAME: &str = "Loyalty Points";

/// Decimal places used by the token contract.
pub const TOKEN_DECIMALS: u32 = 7;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Simulation failed: {0}")]
    Simulation(String),

    #[error("Contract not initialized")]
    ContractNotInitialized,

    #[error("Transaction {hash} not confirmed after {attempts} attempts")]
    ConfirmationTimeout { hash: String, attempts: u32 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
}

impl LedgerError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Network(_))
    }
}

/// Contract methods exposed by the token contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerMethod {
    Balance,
    Mint,
    Burn,
    Transfer,
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    Allowance,
    Approve,
}

impl LedgerMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerMethod::Balance => "balance",
            LedgerMethod::Mint => "mint",
            LedgerMethod::Burn => "burn",
            LedgerMethod::Transfer => "transfer",
            LedgerMethod::Name => "name",
            LedgerMethod::Symbol => "symbol",
            LedgerMethod::Decimals => "decimals",
            LedgerMethod::TotalSupply => "total_supply",
            LedgerMethod::Allowance => "allowance",
            LedgerMethod::Approve => "approve",
        }
    }

    /// Whether the method changes ledger state (needs a signed transaction).
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            LedgerMethod::Mint | LedgerMethod::Burn | LedgerMethod::Transfer | LedgerMethod::Approve
        )
    }
}

impl std::fmt::Display for LedgerMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A contract invocation: method plus positional arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    pub method: LedgerMethod,
    pub args: Vec<String>,
}

impl ContractCall {
    pub fn new(method: LedgerMethod, args: Vec<String>) -> Self {
        Self { method, args }
    }

    pub fn no_args(method: LedgerMethod) -> Self {
        Self::new(method, Vec::new())
    }
}

/// Confirmation state of a submitted transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionStatus {
    /// Not yet visible on the ledger
    NotFound,
    /// Applied successfully, with the contract's return value
    Success(Option<serde_json::Value>),
    /// Rejected by the ledger
    Failed(String),
}

/// Outcome of a state-changing token operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransactionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransactionResult {
    pub fn succeeded(hash: String, result: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            hash: Some(hash),
            result,
            error: None,
        }
    }

    pub fn failed(hash: Option<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            hash,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Token balance in raw contract units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    /// Raw integer amount as a string
    pub balance: String,
    pub symbol: String,
    pub decimals: u32,
}

impl TokenBalance {
    pub fn new(balance: impl Into<String>) -> Self {
        Self {
            balance: balance.into(),
            symbol: TOKEN_SYMBOL.to_string(),
            decimals: TOKEN_DECIMALS,
        }
    }

    /// Balance shown when the ledger cannot be reached.
    pub fn zero() -> Self {
        Self::new("0")
    }

    /// Human-readable balance, falling back to the raw value.
    pub fn display(&self) -> String {
        format_token_amount(&self.balance, self.decimals).unwrap_or_else(|_| self.balance.clone())
    }
}

/// Token metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub total_supply: String,
}

impl Default for TokenInfo {
    fn default() -> Self {
        Self {
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            decimals: TOKEN_DECIMALS,
            total_supply: "0".to_string(),
        }
    }
}

/// Mint request: award points to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMintParams {
    pub to: String,
    pub amount: String,
}

/// Burn request: redeem a user's points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBurnParams {
    pub from: String,
    pub amount: String,
}

/// Transfer request between users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransferParams {
    pub from: String,
    pub to: String,
    pub amount: String,
}
