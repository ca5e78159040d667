//! Integration tests for the wallet session.

use std::sync::Arc;
use std::time::Duration;

use loyaltymax::ledger::{LedgerMethod, Network, RetryPolicy, TokenOperations};
use loyaltymax::store::{load_json, KeyValueStore, MemoryStore, WALLET_STATE_KEY};
use loyaltymax::wallet::{WalletError, WalletRecord, WalletSession};
use serde_json::json;

use crate::ledger_mock::{MockLedger, MockWallet};

fn persistence() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

fn tokens(ledger: &Arc<MockLedger>) -> TokenOperations<MockLedger> {
    TokenOperations::new(Arc::clone(ledger)).with_retry_policy(RetryPolicy::new(3))
}

#[tokio::test]
async fn test_connection_is_restored() {
    let store = persistence();

    {
        let session = WalletSession::new(
            Arc::new(MockWallet::approving("GHOLDER")),
            Arc::clone(&store),
            Network::Testnet,
        );
        session.connect().await.unwrap();
        session.switch_network(Network::Mainnet).await;
    }

    let record: WalletRecord = load_json(store.as_ref(), WALLET_STATE_KEY).unwrap().unwrap();
    assert!(record.is_connected);
    assert_eq!(record.network, Network::Mainnet);
    assert_eq!(record.wallet_id.as_deref(), Some("mock"));

    let restored = WalletSession::new(
        Arc::new(MockWallet::rejecting()),
        Arc::clone(&store),
        Network::Testnet,
    );
    assert!(restored.is_connected().await);
    assert_eq!(restored.address().await.as_deref(), Some("GHOLDER"));
    assert_eq!(restored.network().await, Network::Mainnet);
}

#[tokio::test]
async fn test_unreadable_record_is_ignored() {
    let store = persistence();
    store.set(WALLET_STATE_KEY, "[1, 2").unwrap();

    let session = WalletSession::new(
        Arc::new(MockWallet::approving("GHOLDER")),
        store,
        Network::Mainnet,
    );
    let state = session.state().await;
    assert!(!state.is_connected);
    assert_eq!(state.network, Network::Mainnet);
}

#[tokio::test]
async fn test_refresh_requires_connection() {
    let ledger = Arc::new(MockLedger::default());
    let session = WalletSession::new(
        Arc::new(MockWallet::approving("GHOLDER")),
        persistence(),
        Network::Testnet,
    );

    assert!(matches!(
        session.refresh_balance(&tokens(&ledger)).await,
        Err(WalletError::NotConnected)
    ));
    assert!(session.balance().is_none());
}

#[tokio::test]
async fn test_refresh_balance() {
    let ledger = Arc::new(MockLedger::default().with_value(LedgerMethod::Balance, json!("42")));
    let session = WalletSession::new(
        Arc::new(MockWallet::approving("GHOLDER")),
        persistence(),
        Network::Testnet,
    );
    session.connect().await.unwrap();

    let balance = session.refresh_balance(&tokens(&ledger)).await.unwrap();
    assert_eq!(balance.balance, "42");
    assert_eq!(session.balance(), Some(balance));

    let reads = ledger.reads.lock().unwrap();
    assert_eq!(reads[0].args, vec!["GHOLDER"]);
}

#[tokio::test]
async fn test_stale_balance_response_is_discarded() {
    let ledger = Arc::new(MockLedger::default());
    // First request resolves last
    ledger.script_balance(Duration::from_millis(60), "100");
    ledger.script_balance(Duration::from_millis(0), "200");

    let session = WalletSession::new(
        Arc::new(MockWallet::approving("GHOLDER")),
        persistence(),
        Network::Testnet,
    );
    session.connect().await.unwrap();

    let ops = tokens(&ledger);
    let (older, newer) = tokio::join!(session.refresh_balance(&ops), session.refresh_balance(&ops));

    assert_eq!(newer.unwrap().balance, "200");
    assert_eq!(older.unwrap().balance, "200");
    assert_eq!(session.balance().unwrap().balance, "200");
}

#[tokio::test]
async fn test_failed_refresh_records_error() {
    let ledger = Arc::new(MockLedger {
        read_error: Some("rpc unreachable".to_string()),
        ..Default::default()
    });
    let session = WalletSession::new(
        Arc::new(MockWallet::approving("GHOLDER")),
        persistence(),
        Network::Testnet,
    );
    session.connect().await.unwrap();

    assert!(matches!(
        session.refresh_balance(&tokens(&ledger)).await,
        Err(WalletError::Ledger(_))
    ));
    assert!(session.error().await.unwrap().contains("rpc unreachable"));
}

#[tokio::test]
async fn test_failed_reconnect_drops_previous_connection() {
    let store = persistence();
    let wallet = Arc::new(MockWallet::approving("GFIRST"));
    let ledger = Arc::new(MockLedger::default().with_value(LedgerMethod::Balance, json!("12")));
    let session = WalletSession::new(Arc::clone(&wallet), Arc::clone(&store), Network::Testnet);

    session.connect().await.unwrap();
    session.refresh_balance(&tokens(&ledger)).await.unwrap();

    wallet.revoke();
    assert!(matches!(
        session.connect().await,
        Err(WalletError::Rejected(_))
    ));

    let state = session.state().await;
    assert!(!state.is_connected);
    assert!(state.public_key.is_none());
    assert!(state.wallet_id.is_none());
    assert!(state.error.is_some());
    assert!(session.balance().is_none());

    let record: WalletRecord = load_json(store.as_ref(), WALLET_STATE_KEY).unwrap().unwrap();
    assert!(!record.is_connected);
    assert!(record.public_key.is_none());
}

#[tokio::test]
async fn test_switch_network_needs_fresh_balance() {
    let ledger = Arc::new(MockLedger::default().with_value(LedgerMethod::Balance, json!("5")));
    let session = WalletSession::new(
        Arc::new(MockWallet::approving("GHOLDER")),
        persistence(),
        Network::Testnet,
    );
    session.connect().await.unwrap();
    session.refresh_balance(&tokens(&ledger)).await.unwrap();

    session.switch_network(Network::Mainnet).await;
    assert!(session.balance().is_none());
    assert!(session.is_connected().await);

    let mainnet = Arc::new(MockLedger::default().with_value(LedgerMethod::Balance, json!("77")));
    let balance = session.refresh_balance(&tokens(&mainnet)).await.unwrap();
    assert_eq!(balance.balance, "77");
    assert_eq!(session.balance().unwrap().balance, "77");
}

#[tokio::test]
async fn test_disconnect_drops_balance() {
    let ledger = Arc::new(MockLedger::default().with_value(LedgerMethod::Balance, json!("9")));
    let session = WalletSession::new(
        Arc::new(MockWallet::approving("GHOLDER")),
        persistence(),
        Network::Mainnet,
    );
    session.connect().await.unwrap();
    session.refresh_balance(&tokens(&ledger)).await.unwrap();

    session.disconnect().await;
    assert!(session.balance().is_none());
    assert!(!session.is_connected().await);
    assert_eq!(session.network().await, Network::Mainnet);
}
