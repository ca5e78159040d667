//! Wallet connection facade.
//!
//! [`WalletSession`] tracks the connection to an external wallet provider,
//! persists the connection metadata, and keeps the holder's token balance
//! current through [`TokenOperations`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::ledger::{
    BalanceTracker, LedgerClient, LedgerError, Network, TokenBalance, TokenOperations,
};
use crate::store::{load_json, save_json, KeyValueStore, PersistenceError, WALLET_STATE_KEY};

/// Wallet errors
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Wallet not available: {0}")]
    NotAvailable(String),

    #[error("Connection rejected: {0}")]
    Rejected(String),

    #[error("Wallet not connected")]
    NotConnected,

    #[error("Connection already in progress")]
    AlreadyConnecting,

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// External wallet capability.
pub trait WalletProvider: Send + Sync {
    /// Identifier of the wallet implementation (e.g. "freighter")
    fn wallet_id(&self) -> &str;

    /// Ask the wallet for the holder's public key.
    fn address(&self) -> impl std::future::Future<Output = Result<String, WalletError>> + Send;
}

/// Persisted connection metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletRecord {
    pub is_connected: bool,
    pub public_key: Option<String>,
    pub network: Network,
    pub wallet_id: Option<String>,
}

/// Observable wallet state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WalletState {
    pub is_connected: bool,
    pub is_connecting: bool,
    pub public_key: Option<String>,
    pub network: Network,
    pub wallet_id: Option<String>,
    pub error: Option<String>,
}

impl WalletState {
    fn from_record(record: WalletRecord) -> Self {
        // A connected record without a key is unusable
        let is_connected = record.is_connected && record.public_key.is_some();
        Self {
            is_connected,
            is_connecting: false,
            public_key: record.public_key.filter(|_| is_connected),
            network: record.network,
            wallet_id: record.wallet_id.filter(|_| is_connected),
            error: None,
        }
    }

    fn record(&self) -> WalletRecord {
        WalletRecord {
            is_connected: self.is_connected,
            public_key: self.public_key.clone(),
            network: self.network,
            wallet_id: self.wallet_id.clone(),
        }
    }
}

/// Wallet connection session.
pub struct WalletSession<P> {
    provider: Arc<P>,
    persistence: Arc<dyn KeyValueStore>,
    state: Arc<RwLock<WalletState>>,
    balances: Arc<BalanceTracker>,
}

impl<P> Clone for WalletSession<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            persistence: Arc::clone(&self.persistence),
            state: Arc::clone(&self.state),
            balances: Arc::clone(&self.balances),
        }
    }
}

impl<P: WalletProvider> WalletSession<P> {
    /// Create a session, restoring any persisted connection.
    pub fn new(provider: Arc<P>, persistence: Arc<dyn KeyValueStore>, network: Network) -> Self {
        let state = match load_json::<WalletRecord>(persistence.as_ref(), WALLET_STATE_KEY) {
            Ok(Some(record)) => {
                let state = WalletState::from_record(record);
                if state.is_connected {
                    tracing::info!(
                        "Restored wallet connection on {} ({})",
                        state.network,
                        state.wallet_id.as_deref().unwrap_or("unknown")
                    );
                }
                state
            }
            Ok(None) => WalletState {
                network,
                ..Default::default()
            },
            Err(e) => {
                tracing::warn!("Ignoring unreadable wallet record: {}", e);
                WalletState {
                    network,
                    ..Default::default()
                }
            }
        };

        Self {
            provider,
            persistence,
            state: Arc::new(RwLock::new(state)),
            balances: Arc::new(BalanceTracker::new()),
        }
    }

    /// Current state snapshot.
    pub async fn state(&self) -> WalletState {
        self.state.read().await.clone()
    }

    pub async fn address(&self) -> Option<String> {
        self.state.read().await.public_key.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.is_connected
    }

    pub async fn is_connecting(&self) -> bool {
        self.state.read().await.is_connecting
    }

    pub async fn network(&self) -> Network {
        self.state.read().await.network
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    /// Latest applied balance, if any.
    pub fn balance(&self) -> Option<TokenBalance> {
        self.balances.latest()
    }

    /// Connect to the wallet and remember the holder's address.
    ///
    /// A failed attempt drops any previous connection. The balance is not
    /// fetched; call [`WalletSession::refresh_balance`] once connected.
    pub async fn connect(&self) -> Result<String, WalletError> {
        {
            let mut state = self.state.write().await;
            if state.is_connecting {
                return Err(WalletError::AlreadyConnecting);
            }
            state.is_connecting = true;
            state.error = None;
        }

        let result = self.provider.address().await;

        let mut state = self.state.write().await;
        state.is_connecting = false;
        match result {
            Ok(address) => {
                tracing::info!("Wallet connected via {}", self.provider.wallet_id());
                state.is_connected = true;
                state.public_key = Some(address.clone());
                state.wallet_id = Some(self.provider.wallet_id().to_string());
                self.persist(&state);
                Ok(address)
            }
            Err(e) => {
                tracing::warn!("Wallet connection failed: {}", e);
                state.is_connected = false;
                state.public_key = None;
                state.wallet_id = None;
                state.error = Some(e.to_string());
                self.balances.reset();
                self.persist(&state);
                Err(e)
            }
        }
    }

    /// Forget the connection. The network choice is kept.
    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        let network = state.network;
        *state = WalletState {
            network,
            ..Default::default()
        };
        self.balances.reset();
        self.persist(&state);
        tracing::info!("Wallet disconnected");
    }

    /// Switch networks. Balances from the previous network are dropped and
    /// in-flight refreshes are discarded; refresh again against the new
    /// network's [`TokenOperations`].
    pub async fn switch_network(&self, network: Network) {
        let mut state = self.state.write().await;
        if state.network == network {
            return;
        }
        tracing::info!("Switching network {} -> {}", state.network, network);
        state.network = network;
        self.balances.reset();
        self.persist(&state);
    }

    /// Fetch the holder's balance. Responses that arrive after a newer one
    /// are discarded; the freshest known balance is returned.
    pub async fn refresh_balance<L: LedgerClient>(
        &self,
        tokens: &TokenOperations<L>,
    ) -> Result<TokenBalance, WalletError> {
        let address = self.address().await.ok_or(WalletError::NotConnected)?;
        let ticket = self.balances.begin();

        match tokens.try_balance(&address).await {
            Ok(balance) => {
                if self.balances.apply(ticket, balance.clone()) {
                    tracing::debug!("Balance updated to {} {}", balance.display(), balance.symbol);
                }
                Ok(self.balances.latest().unwrap_or(balance))
            }
            Err(e) => {
                if self.balances.is_current(ticket) {
                    self.state.write().await.error = Some(e.to_string());
                }
                tracing::warn!("Balance refresh failed: {}", e);
                Err(e.into())
            }
        }
    }

    fn persist(&self, state: &WalletState) {
        if let Err(e) = save_json(self.persistence.as_ref(), WALLET_STATE_KEY, &state.record()) {
            tracing::warn!("Failed to persist wallet state: {}", e);
        }
    }
}
