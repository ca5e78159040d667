//! Scriptable in-memory ledger and wallet for facade tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use loyaltymax::ledger::{ContractCall, LedgerClient, LedgerError, LedgerMethod, TransactionStatus};
use loyaltymax::wallet::{WalletError, WalletProvider};
use serde_json::{json, Value};

/// How submitted transactions resolve.
#[derive(Debug, Clone)]
pub enum Confirmation {
    /// Report `NotFound` this many times, then success
    AfterPolls(u32),
    /// Never leaves `NotFound`
    Never,
    /// Ledger rejects the transaction
    Rejected(String),
}

/// Mock ledger recording every call.
pub struct MockLedger {
    pub confirmation: Confirmation,
    pub submit_error: Option<String>,
    pub read_error: Option<String>,
    /// Values returned by read calls, keyed by method
    pub values: HashMap<LedgerMethod, Value>,
    /// Per-invocation `(delay, balance)` overrides for balance reads
    pub balance_script: Mutex<VecDeque<(Duration, String)>>,
    pub submitted: Mutex<Vec<(String, ContractCall)>>,
    pub reads: Mutex<Vec<ContractCall>>,
    pub polls: AtomicU32,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self {
            confirmation: Confirmation::AfterPolls(0),
            submit_error: None,
            read_error: None,
            values: HashMap::new(),
            balance_script: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            reads: Mutex::new(Vec::new()),
            polls: AtomicU32::new(0),
        }
    }
}

impl MockLedger {
    pub fn with_value(mut self, method: LedgerMethod, value: Value) -> Self {
        self.values.insert(method, value);
        self
    }

    pub fn script_balance(&self, delay: Duration, balance: &str) {
        self.balance_script
            .lock()
            .unwrap()
            .push_back((delay, balance.to_string()));
    }

    pub fn submitted(&self) -> Vec<(String, ContractCall)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }
}

impl LedgerClient for MockLedger {
    async fn call(&self, call: &ContractCall) -> Result<Option<Value>, LedgerError> {
        self.reads.lock().unwrap().push(call.clone());
        if let Some(error) = &self.read_error {
            return Err(LedgerError::Network(error.clone()));
        }

        if call.method == LedgerMethod::Balance {
            let scripted = self.balance_script.lock().unwrap().pop_front();
            if let Some((delay, balance)) = scripted {
                tokio::time::sleep(delay).await;
                return Ok(Some(json!(balance)));
            }
        }

        Ok(self.values.get(&call.method).cloned())
    }

    async fn submit(&self, signer: &str, call: &ContractCall) -> Result<String, LedgerError> {
        if let Some(error) = &self.submit_error {
            return Err(LedgerError::Simulation(error.clone()));
        }
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push((signer.to_string(), call.clone()));
        Ok(format!("tx{}", submitted.len()))
    }

    async fn transaction_status(&self, hash: &str) -> Result<TransactionStatus, LedgerError> {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(match &self.confirmation {
            Confirmation::AfterPolls(n) if poll >= *n => {
                TransactionStatus::Success(Some(json!({ "hash": hash })))
            }
            Confirmation::Rejected(reason) => TransactionStatus::Failed(reason.clone()),
            _ => TransactionStatus::NotFound,
        })
    }
}

/// Wallet that answers with its current address, or rejects when locked.
pub struct MockWallet {
    pub address: Mutex<Option<String>>,
}

impl MockWallet {
    pub fn approving(address: &str) -> Self {
        Self {
            address: Mutex::new(Some(address.to_string())),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            address: Mutex::new(None),
        }
    }

    /// Reject every further request.
    pub fn revoke(&self) {
        *self.address.lock().unwrap() = None;
    }
}

impl WalletProvider for MockWallet {
    fn wallet_id(&self) -> &str {
        "mock"
    }

    async fn address(&self) -> Result<String, WalletError> {
        let address = self.address.lock().unwrap().clone();
        address.ok_or_else(|| WalletError::Rejected("User declined access".to_string()))
    }
}
