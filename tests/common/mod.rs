use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, Mutex};

use consensus_signals::config::Settings;
use consensus_signals::market::{GatewayError, MarketGateway};
use consensus_signals::models::{Fill, Side, Signal, Wallet, WalletState};
use consensus_signals::services::{NotificationSink, SignalEngine};
use consensus_signals::store::MemoryStore;

/// Scripted venue: fills and account state per wallet, a price per
/// instrument, and a set of wallets whose requests fail.
#[derive(Default)]
pub struct FakeGateway {
    fills: Mutex<HashMap<String, Vec<Fill>>>,
    prices: Mutex<HashMap<String, Decimal>>,
    states: Mutex<HashMap<String, WalletState>>,
    failing: Mutex<HashSet<String>>,
}

#[allow(dead_code)]
impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_fill(&self, fill: Fill) {
        self.fills
            .lock()
            .await
            .entry(fill.wallet_address.to_lowercase())
            .or_default()
            .push(fill);
    }

    pub async fn set_price(&self, instrument: &str, price: Decimal) {
        self.prices.lock().await.insert(instrument.to_string(), price);
    }

    pub async fn set_wallet_state(&self, state: WalletState) {
        self.states
            .lock()
            .await
            .insert(state.address.to_lowercase(), state);
    }

    pub async fn fail_wallet(&self, address: &str) {
        self.failing.lock().await.insert(address.to_lowercase());
    }
}

#[async_trait]
impl MarketGateway for FakeGateway {
    async fn fills(&self, address: &str) -> Result<Vec<Fill>, GatewayError> {
        if self.failing.lock().await.contains(&address.to_lowercase()) {
            return Err(GatewayError::Status(500));
        }
        Ok(self
            .fills
            .lock()
            .await
            .get(&address.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn mark_price(&self, instrument: &str) -> Result<Option<Decimal>, GatewayError> {
        Ok(self.prices.lock().await.get(instrument).copied())
    }

    async fn wallet_state(&self, address: &str) -> Result<WalletState, GatewayError> {
        if self.failing.lock().await.contains(&address.to_lowercase()) {
            return Err(GatewayError::Status(500));
        }
        let state = self.states.lock().await.get(&address.to_lowercase()).cloned();
        Ok(state.unwrap_or_else(|| WalletState {
            address: address.to_string(),
            account_value: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            positions: Vec::new(),
        }))
    }
}

/// Sink that forwards every notified signal to a channel.
#[allow(dead_code)]
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<Signal>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Signal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, signal: &Signal) {
        let _ = self.tx.send(signal.clone());
    }
}

#[allow(dead_code)]
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

#[allow(dead_code)]
pub fn addr(i: usize) -> String {
    format!("0x{:040x}", i)
}

/// Five wallets, 10 minute window, 100k minimum volume, -2.5% stop, 2%/5% targets.
#[allow(dead_code)]
pub fn scenario_settings() -> Settings {
    Settings {
        min_wallet_count: 5,
        time_window_minutes: 10,
        min_volume: Decimal::from(100_000),
        default_stop_loss_pct: Decimal::new(-25, 1),
        take_profit_targets: vec![Decimal::from(2), Decimal::from(5)],
    }
}

#[allow(dead_code)]
pub fn opening_fill(wallet: &str, instrument: &str, side: Side, price: i64, time: DateTime<Utc>) -> Fill {
    Fill {
        instrument: instrument.into(),
        side,
        size: Decimal::ONE,
        price: Decimal::from(price),
        time_ms: time.timestamp_millis(),
        start_position: Decimal::ZERO,
        leverage: Decimal::from(10),
        wallet_address: wallet.into(),
    }
}

#[allow(dead_code)]
pub fn wallets(n: usize) -> Vec<Wallet> {
    (1..=n).map(|i| Wallet::new(addr(i), t0())).collect()
}

#[allow(dead_code)]
pub struct Harness {
    pub engine: Arc<SignalEngine>,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<FakeGateway>,
}

/// Engine over a memory store seeded with `tracked` wallets.
#[allow(dead_code)]
pub fn harness(tracked: Vec<Wallet>, settings: Settings, sink: Option<Arc<dyn NotificationSink>>) -> Harness {
    let store = Arc::new(MemoryStore::with_wallets(tracked));
    let gateway = Arc::new(FakeGateway::new());
    let engine = Arc::new(SignalEngine::new(
        store.clone(),
        gateway.clone(),
        sink,
        settings,
        Duration::from_secs(5),
    ));

    Harness {
        engine,
        store,
        gateway,
    }
}

/// Wallets 1..=6 each buy one BTC at 50000, one minute apart starting at `t0()`.
#[allow(dead_code)]
pub async fn seed_btc_cluster(gateway: &FakeGateway) {
    for i in 1..=6 {
        let time = t0() + chrono::Duration::minutes(i as i64 - 1);
        gateway
            .push_fill(opening_fill(&addr(i), "BTC", Side::Buy, 50_000, time))
            .await;
    }
}
