pub mod hyperliquid;
pub mod types;

pub use hyperliquid::InfoClient;
pub use types::{ApiClearinghouseState, ApiFill, InfoRequest};

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{Fill, WalletState};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {0}")]
    Status(u16),

    #[error("unexpected response: {0}")]
    Unexpected(String),

    #[error("gateway call timed out after {0}s")]
    Timeout(u64),
}

/// Read-only view of the venue: per-wallet fills and account state, and
/// per-instrument prices.
#[async_trait]
pub trait MarketGateway: Send + Sync {
    /// Fill history for one wallet. Ordering is not guaranteed.
    async fn fills(&self, address: &str) -> Result<Vec<Fill>, GatewayError>;

    /// Current mark price, `None` when the venue has no price for it.
    async fn mark_price(&self, instrument: &str) -> Result<Option<Decimal>, GatewayError>;

    /// Open positions and account value for one wallet.
    async fn wallet_state(&self, address: &str) -> Result<WalletState, GatewayError>;
}
