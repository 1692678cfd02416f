mod common;

use chrono::Duration as ChronoDuration;

use consensus_signals::config::SettingsError;
use consensus_signals::services::RegistryError;
use consensus_signals::store::Store;

use common::{addr, harness, scenario_settings, seed_btc_cluster, t0, wallets};

#[tokio::test]
async fn test_add_wallet_trims_and_persists() {
    let h = harness(Vec::new(), scenario_settings(), None);

    let wallet = h.engine.add_wallet("  0xAbC  ", t0()).await.unwrap();
    assert_eq!(wallet.address, "0xAbC");
    assert_eq!(wallet.added_on, t0());
    assert_eq!(wallet.total_trades, 0);

    let stored = h.store.load_wallets().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].address, "0xAbC");
}

#[tokio::test]
async fn test_add_wallet_rejects_case_insensitive_duplicate() {
    let h = harness(Vec::new(), scenario_settings(), None);
    h.engine.add_wallet("0xabc", t0()).await.unwrap();

    let err = h.engine.add_wallet("0xABC", t0()).await.unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyExists(_)));
    assert_eq!(h.store.load_wallets().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_add_wallet_rejects_blank_address() {
    let h = harness(Vec::new(), scenario_settings(), None);

    for bad in ["", "   ", "0x1 0x2"] {
        let err = h.engine.add_wallet(bad, t0()).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidAddress(_)), "{bad:?}");
    }
}

#[tokio::test]
async fn test_remove_wallet_any_case() {
    let h = harness(wallets(3), scenario_settings(), None);

    let removed = h.engine.remove_wallet(&addr(2).to_uppercase()).await.unwrap();
    assert_eq!(removed.address, addr(2));

    let stored = h.store.load_wallets().await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|w| w.address != addr(2)));

    let err = h.engine.remove_wallet(&addr(2)).await.unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_signal() {
    let h = harness(wallets(6), scenario_settings(), None);
    seed_btc_cluster(&h.gateway).await;
    let report = h
        .engine
        .run_detection_pass(t0() + ChronoDuration::minutes(6))
        .await
        .unwrap();
    let id = report.created[0].clone();

    let removed = h.engine.delete_signal(&id).await.unwrap();
    assert_eq!(removed.id, id);
    assert!(h.store.load_signals().await.unwrap().is_empty());

    // Cooldowns recorded by the signal stay in place
    let stored = h.store.load_wallets().await.unwrap();
    assert!(stored.iter().all(|w| w.cooldowns.contains_key("BTC")));

    let err = h.engine.delete_signal(&id).await.unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(_)));
}

#[tokio::test]
async fn test_update_settings_persists_and_swaps() {
    let h = harness(Vec::new(), scenario_settings(), None);

    let saved = h
        .engine
        .update_settings(|mut s| {
            s.time_window_minutes = 30;
            s
        })
        .await
        .unwrap();
    assert_eq!(saved.time_window_minutes, 30);
    assert_eq!(h.engine.settings().await, saved);
    assert_eq!(h.store.load_settings().await.unwrap(), Some(saved));
}

#[tokio::test]
async fn test_update_settings_rejects_invalid() {
    let h = harness(Vec::new(), scenario_settings(), None);

    let err = h
        .engine
        .update_settings(|mut s| {
            s.take_profit_targets.clear();
            s
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InvalidSettings(SettingsError::NoTakeProfitTargets)
    ));
    assert_eq!(h.engine.settings().await, scenario_settings());
    assert!(h.store.load_settings().await.unwrap().is_none());
}
