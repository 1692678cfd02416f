use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Direction;

/// One open perp position as reported by the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPosition {
    pub instrument: String,
    pub direction: Direction,
    /// Absolute size; the sign lives in `direction`.
    pub size: Decimal,
    pub entry_price: Option<Decimal>,
    pub position_value: Decimal,
    pub unrealized_pnl: Decimal,
    /// Return on equity in percent.
    pub roe_pct: Decimal,
    pub leverage: Option<Decimal>,
}

/// Live account snapshot for any wallet, tracked or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletState {
    pub address: String,
    pub account_value: Decimal,
    /// Σ unrealized PnL over `positions`.
    pub unrealized_pnl: Decimal,
    pub positions: Vec<OpenPosition>,
}
