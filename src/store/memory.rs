use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Store, StoreError};
use crate::config::Settings;
use crate::models::{Signal, Wallet};

/// Process-local store. Used for dry runs and by the integration tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    wallets: RwLock<Vec<Wallet>>,
    signals: RwLock<Vec<Signal>>,
    settings: RwLock<Option<Settings>>,
    fail_writes: AtomicBool,
    failing_wallet_writes: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wallets(wallets: Vec<Wallet>) -> Self {
        Self {
            wallets: RwLock::new(wallets),
            ..Self::default()
        }
    }

    /// Make every subsequent write fail, simulating a broken backend.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Fail the next `count` writes that include the wallet collection.
    pub fn fail_next_wallet_writes(&self, count: u32) {
        self.failing_wallet_writes.store(count, Ordering::Relaxed);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }

    fn check_wallets_writable(&self) -> Result<(), StoreError> {
        self.check_writable()?;
        let consumed = self
            .failing_wallet_writes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
        if consumed.is_ok() {
            return Err(StoreError::Unavailable("wallet write failed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_wallets(&self) -> Result<Vec<Wallet>, StoreError> {
        Ok(self.wallets.read().await.clone())
    }

    async fn replace_wallets(&self, wallets: &[Wallet]) -> Result<(), StoreError> {
        self.check_wallets_writable()?;
        *self.wallets.write().await = wallets.to_vec();
        Ok(())
    }

    async fn load_signals(&self) -> Result<Vec<Signal>, StoreError> {
        Ok(self.signals.read().await.clone())
    }

    async fn replace_signals(&self, signals: &[Signal]) -> Result<(), StoreError> {
        self.check_writable()?;
        *self.signals.write().await = signals.to_vec();
        Ok(())
    }

    async fn replace_all(&self, wallets: &[Wallet], signals: &[Signal]) -> Result<(), StoreError> {
        self.check_wallets_writable()?;

        // Hold both slots so no reader sees one collection without the other
        let mut wallet_slot = self.wallets.write().await;
        let mut signal_slot = self.signals.write().await;
        *wallet_slot = wallets.to_vec();
        *signal_slot = signals.to_vec();
        Ok(())
    }

    async fn load_settings(&self) -> Result<Option<Settings>, StoreError> {
        Ok(self.settings.read().await.clone())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        self.check_writable()?;
        *self.settings.write().await = Some(settings.clone());
        Ok(())
    }
}
