pub mod json_file;
pub mod memory;
pub mod postgres;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Settings;
use crate::models::{Signal, Wallet};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Whole-collection persistence for wallets and signals.
///
/// Every `replace_*` call must swap the entire collection atomically: a
/// reader sees either the old or the new collection, never a mix.
#[async_trait]
pub trait Store: Send + Sync {
    async fn load_wallets(&self) -> Result<Vec<Wallet>, StoreError>;

    async fn replace_wallets(&self, wallets: &[Wallet]) -> Result<(), StoreError>;

    async fn load_signals(&self) -> Result<Vec<Signal>, StoreError>;

    async fn replace_signals(&self, signals: &[Signal]) -> Result<(), StoreError>;

    /// Replace both collections as one unit. Passes that touch signals and
    /// wallets together commit through here, so a failure leaves neither
    /// collection changed.
    async fn replace_all(&self, wallets: &[Wallet], signals: &[Signal]) -> Result<(), StoreError>;

    /// Settings saved through the API, if any were ever saved.
    async fn load_settings(&self) -> Result<Option<Settings>, StoreError>;

    async fn save_settings(&self, settings: &Settings) -> Result<(), StoreError>;

    /// Cheap reachability probe for health checks.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Newest signals first, the order every reader expects.
pub fn sort_newest_first(signals: &mut [Signal]) {
    signals.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}
