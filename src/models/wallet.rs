use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A tracked wallet and its running performance statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub address: String,
    pub added_on: DateTime<Utc>,
    #[serde(default)]
    pub total_pnl: Decimal,
    #[serde(default)]
    pub total_trades: u32,
    #[serde(default)]
    pub winning_trades: u32,
    /// Instrument -> time a signal was last triggered with this wallet.
    #[serde(default)]
    pub cooldowns: BTreeMap<String, DateTime<Utc>>,
}

impl Wallet {
    pub fn new(address: impl Into<String>, added_on: DateTime<Utc>) -> Self {
        Self {
            address: address.into(),
            added_on,
            total_pnl: Decimal::ZERO,
            total_trades: 0,
            winning_trades: 0,
            cooldowns: BTreeMap::new(),
        }
    }

    /// Addresses are compared case-insensitively everywhere.
    pub fn matches(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address)
    }

    /// Percentage of attributed signals that closed at take-profit.
    pub fn success_rate(&self) -> Decimal {
        if self.total_trades == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.winning_trades) / Decimal::from(self.total_trades)
            * Decimal::ONE_HUNDRED
    }
}
