use chrono::{DateTime, Utc};
use metrics::gauge;
use thiserror::Error;

use super::engine::SignalEngine;
use crate::config::{Settings, SettingsError};
use crate::models::{Signal, Wallet};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("wallet {0} is already tracked")]
    AlreadyExists(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid wallet address: {0:?}")]
    InvalidAddress(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SignalEngine {
    /// Start tracking a wallet. Addresses are compared case-insensitively and
    /// stored as given, trimmed.
    pub async fn add_wallet(&self, address: &str, now: DateTime<Utc>) -> Result<Wallet, RegistryError> {
        let address = address.trim();
        if address.is_empty() || address.chars().any(char::is_whitespace) {
            return Err(RegistryError::InvalidAddress(address.to_string()));
        }

        let _guard = self.writer().await;
        let mut wallets = self.store().load_wallets().await?;
        if wallets.iter().any(|w| w.matches(address)) {
            return Err(RegistryError::AlreadyExists(address.to_string()));
        }

        let wallet = Wallet::new(address, now);
        wallets.push(wallet.clone());
        self.store().replace_wallets(&wallets).await?;
        gauge!("tracked_wallets").set(wallets.len() as f64);

        tracing::info!(address = %address, total = wallets.len(), "Wallet added");
        Ok(wallet)
    }

    /// Stop tracking a wallet. Its past attribution stays on the signals.
    pub async fn remove_wallet(&self, address: &str) -> Result<Wallet, RegistryError> {
        let _guard = self.writer().await;
        let mut wallets = self.store().load_wallets().await?;

        let Some(pos) = wallets.iter().position(|w| w.matches(address.trim())) else {
            return Err(RegistryError::NotFound(format!("wallet {address}")));
        };

        let removed = wallets.remove(pos);
        self.store().replace_wallets(&wallets).await?;
        gauge!("tracked_wallets").set(wallets.len() as f64);

        tracing::info!(address = %removed.address, total = wallets.len(), "Wallet removed");
        Ok(removed)
    }

    /// Delete one signal by id. Cooldowns and wallet stats are left as they are.
    pub async fn delete_signal(&self, id: &str) -> Result<Signal, RegistryError> {
        let _guard = self.writer().await;
        let mut signals = self.store().load_signals().await?;

        let Some(pos) = signals.iter().position(|s| s.id == id) else {
            return Err(RegistryError::NotFound(format!("signal {id}")));
        };

        let removed = signals.remove(pos);
        self.store().replace_signals(&signals).await?;
        gauge!("open_signals").set(signals.iter().filter(|s| s.is_open()).count() as f64);

        tracing::info!(signal_id = %removed.id, "Signal deleted");
        Ok(removed)
    }

    /// Apply `change` to the current detection settings, validate and persist
    /// the result, then make it live. Passes already running keep the
    /// settings they started with.
    pub async fn update_settings<F>(&self, change: F) -> Result<Settings, RegistryError>
    where
        F: FnOnce(Settings) -> Settings,
    {
        let _guard = self.writer().await;
        let settings = change(self.settings().await);
        settings.validate()?;

        self.store().save_settings(&settings).await?;
        let previous = self.swap_settings(settings.clone()).await;

        tracing::info!(
            min_wallet_count = settings.min_wallet_count,
            time_window_minutes = settings.time_window_minutes,
            min_volume = %settings.min_volume,
            previous_min_wallet_count = previous.min_wallet_count,
            previous_time_window_minutes = previous.time_window_minutes,
            "Detection settings updated"
        );
        Ok(settings)
    }
}
