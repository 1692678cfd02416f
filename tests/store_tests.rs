mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use rust_decimal_macros::dec;

use consensus_signals::models::SignalStatus;
use consensus_signals::services::SignalEngine;
use consensus_signals::store::{JsonFileStore, Store, StoreError};

use common::{scenario_settings, seed_btc_cluster, t0, wallets, FakeGateway};

#[tokio::test]
async fn test_missing_files_read_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("not-yet-created"));

    assert!(store.load_wallets().await.unwrap().is_empty());
    assert!(store.load_signals().await.unwrap().is_empty());
    assert!(store.ping().await.is_ok());
}

#[tokio::test]
async fn test_empty_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("signals.json"), "\n").unwrap();
    let store = JsonFileStore::new(dir.path());

    assert!(store.load_signals().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("wallets.json"), "{ not json").unwrap();
    let store = JsonFileStore::new(dir.path());

    let err = store.load_wallets().await.unwrap_err();
    assert!(matches!(err, StoreError::Json(_)));
}

#[tokio::test]
async fn test_replace_swaps_whole_collection() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());

    store.replace_wallets(&wallets(3)).await.unwrap();
    assert_eq!(store.load_wallets().await.unwrap().len(), 3);

    store.replace_wallets(&wallets(1)).await.unwrap();
    assert_eq!(store.load_wallets().await.unwrap(), wallets(1));

    // No temp file left behind
    assert!(!dir.path().join("wallets.json.tmp").exists());
}

#[tokio::test]
async fn test_replace_all_is_all_or_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    store.replace_wallets(&wallets(1)).await.unwrap();

    // A directory squatting on the signals temp path makes staging fail
    std::fs::create_dir(dir.path().join("signals.json.tmp")).unwrap();
    assert!(store.replace_all(&wallets(3), &[]).await.is_err());
    assert_eq!(store.load_wallets().await.unwrap(), wallets(1));
    assert!(!dir.path().join("signals.json").exists());

    std::fs::remove_dir(dir.path().join("signals.json.tmp")).unwrap();
    store.replace_all(&wallets(3), &[]).await.unwrap();
    assert_eq!(store.load_wallets().await.unwrap(), wallets(3));
    assert!(store.load_signals().await.unwrap().is_empty());
    assert!(!dir.path().join("wallets.json.tmp").exists());
    assert!(!dir.path().join("signals.json.tmp").exists());
}

#[tokio::test]
async fn test_settings_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    assert!(store.load_settings().await.unwrap().is_none());

    let mut settings = scenario_settings();
    settings.min_wallet_count = 3;
    settings.take_profit_targets = vec![dec!(1.5)];
    store.save_settings(&settings).await.unwrap();

    let reopened = JsonFileStore::new(dir.path());
    assert_eq!(reopened.load_settings().await.unwrap(), Some(settings));
}

#[tokio::test]
async fn test_ping_rejects_file_in_place_of_dir() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("data");
    std::fs::write(&file, "x").unwrap();

    let store = JsonFileStore::new(&file);
    assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));
}

#[tokio::test]
async fn test_engine_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let now = t0() + ChronoDuration::minutes(6);

    {
        let store = Arc::new(JsonFileStore::new(dir.path()));
        store.replace_wallets(&wallets(6)).await.unwrap();
        let gateway = Arc::new(FakeGateway::new());
        seed_btc_cluster(&gateway).await;

        let engine = SignalEngine::new(store, gateway, None, scenario_settings(), Duration::from_secs(5));
        let report = engine.run_detection_pass(now).await.unwrap();
        assert_eq!(report.created.len(), 1);
    }

    // Fresh process over the same directory
    let store = Arc::new(JsonFileStore::new(dir.path()));
    let gateway = Arc::new(FakeGateway::new());
    gateway.set_price("BTC", dec!(51200)).await;
    let engine = SignalEngine::new(store.clone(), gateway, None, scenario_settings(), Duration::from_secs(5));

    let reloaded = store.load_wallets().await.unwrap();
    assert!(reloaded.iter().all(|w| w.cooldowns.get("BTC") == Some(&now)));

    let report = engine.run_valuation_pass(now).await.unwrap();
    assert_eq!(report.take_profit.len(), 1);

    let signals = store.load_signals().await.unwrap();
    assert_eq!(signals[0].status, SignalStatus::TakeProfit);
    assert_eq!(signals[0].pnl, dec!(7200));
}
