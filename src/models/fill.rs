use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Direction, Side};

/// Leverage assumed when the venue does not report one for a fill.
pub const DEFAULT_LEVERAGE: i64 = 10;

/// A single executed trade for one tracked wallet, already validated at the
/// gateway boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    pub instrument: String,
    pub side: Side,
    pub size: Decimal,
    pub price: Decimal,
    pub time_ms: i64,
    /// Signed position size before this fill was applied.
    pub start_position: Decimal,
    pub leverage: Decimal,
    pub wallet_address: String,
}

impl Fill {
    /// Buying into a flat or long book, or selling into a flat or short one.
    pub fn is_opening(&self) -> bool {
        if self.size <= Decimal::ZERO {
            return false;
        }
        match self.side {
            Side::Buy => self.start_position >= Decimal::ZERO,
            Side::Sell => self.start_position <= Decimal::ZERO,
        }
    }

    pub fn direction(&self) -> Direction {
        self.side.direction()
    }

    pub fn notional(&self) -> Decimal {
        self.price * self.size.abs()
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.time_ms)
    }
}
