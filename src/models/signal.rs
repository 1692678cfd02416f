use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Direction, Fill};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalStatus {
    Open,
    #[serde(rename = "TP")]
    TakeProfit,
    #[serde(rename = "SL")]
    StopLoss,
}

impl SignalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::Open => "Open",
            SignalStatus::TakeProfit => "TP",
            SignalStatus::StopLoss => "SL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(SignalStatus::Open),
            "tp" | "take_profit" => Some(SignalStatus::TakeProfit),
            "sl" | "stop_loss" => Some(SignalStatus::StopLoss),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SignalStatus::Open)
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A consensus signal: several tracked wallets opened the same position on
/// the same instrument inside one time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    /// `instrument|direction|latest fill ms`, stable across detection passes.
    pub id: String,
    pub instrument: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub current_price: Decimal,
    pub pnl: Decimal,
    pub roi: Decimal,
    pub status: SignalStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    pub leverage: Decimal,
    pub margin: Decimal,
    pub size: Decimal,
    pub contributing_wallet_addresses: Vec<String>,
    #[serde(default)]
    pub cluster_fills: Vec<Fill>,
    pub take_profit_levels: Vec<Decimal>,
    pub stop_loss_level: Decimal,
}

impl Signal {
    pub fn make_id(instrument: &str, direction: Direction, latest_fill_ms: i64) -> String {
        format!("{}|{}|{}", instrument, direction, latest_fill_ms)
    }

    pub fn is_open(&self) -> bool {
        self.status == SignalStatus::Open
    }

    pub fn contributing_wallets(&self) -> usize {
        self.contributing_wallet_addresses.len()
    }
}
