use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::fill::DEFAULT_LEVERAGE;
use crate::models::{Direction, Fill, OpenPosition, Side, WalletState};

// ---------------------------------------------------------------------------
// Info endpoint request body
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InfoRequest {
    UserFills { user: String },
    AllMids,
    ClearinghouseState { user: String },
}

// ---------------------------------------------------------------------------
// userFills response row
// ---------------------------------------------------------------------------

/// Leverage as reported on some fill payloads: `{ "type": "cross", "value": 20 }`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiLeverage {
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

fn leverage_value(leverage: Option<ApiLeverage>) -> Option<Decimal> {
    leverage
        .and_then(|l| l.value)
        .and_then(|v| match v {
            serde_json::Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
            serde_json::Value::String(s) => s.parse::<Decimal>().ok(),
            _ => None,
        })
        .filter(|l| *l > Decimal::ZERO)
}

/// Raw fill as returned by `POST /info {"type":"userFills"}`. Everything is
/// optional so one malformed row never fails the whole response.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFill {
    pub coin: Option<String>,
    pub side: Option<String>,
    pub px: Option<String>,
    pub sz: Option<String>,
    pub time: Option<i64>,
    pub start_position: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub leverage: Option<ApiLeverage>,
}

impl ApiFill {
    /// Validate and convert into a domain `Fill`. Returns `None` for rows
    /// with a missing field, a non-positive price, or an unknown side.
    pub fn into_fill(self, wallet_address: &str) -> Option<Fill> {
        let instrument = self.coin.filter(|c| !c.is_empty())?;
        let side = Side::from_api_str(self.side.as_deref()?)?;
        let price: Decimal = self.px?.parse().ok()?;
        let size: Decimal = self.sz?.parse().ok()?;
        let time_ms = self.time?;
        let start_position: Decimal = self.start_position?.parse().ok()?;

        if price <= Decimal::ZERO || size < Decimal::ZERO {
            return None;
        }

        let leverage = leverage_value(self.leverage).unwrap_or(Decimal::from(DEFAULT_LEVERAGE));

        Some(Fill {
            instrument,
            side,
            size,
            price,
            time_ms,
            start_position,
            leverage,
            wallet_address: wallet_address.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// clearinghouseState response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMarginSummary {
    #[serde(default)]
    pub account_value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPosition {
    pub coin: Option<String>,
    pub szi: Option<String>,
    #[serde(default)]
    pub entry_px: Option<String>,
    #[serde(default)]
    pub position_value: Option<String>,
    #[serde(default)]
    pub unrealized_pnl: Option<String>,
    #[serde(default)]
    pub return_on_equity: Option<String>,
    #[serde(default)]
    pub leverage: Option<ApiLeverage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiAssetPosition {
    pub position: ApiPosition,
}

/// Raw `POST /info {"type":"clearinghouseState"}` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClearinghouseState {
    #[serde(default)]
    pub asset_positions: Vec<ApiAssetPosition>,
    #[serde(default)]
    pub margin_summary: Option<ApiMarginSummary>,
}

fn decimal_or_zero(raw: Option<&str>) -> Decimal {
    raw.and_then(|s| s.parse().ok()).unwrap_or(Decimal::ZERO)
}

impl ApiPosition {
    /// `None` for a missing coin or a flat / unparseable size.
    fn into_position(self) -> Option<OpenPosition> {
        let instrument = self.coin.filter(|c| !c.is_empty())?;
        let signed: Decimal = self.szi?.parse().ok()?;
        if signed.is_zero() {
            return None;
        }
        let direction = if signed > Decimal::ZERO {
            Direction::Long
        } else {
            Direction::Short
        };

        Some(OpenPosition {
            instrument,
            direction,
            size: signed.abs(),
            entry_price: self.entry_px.and_then(|p| p.parse().ok()),
            position_value: decimal_or_zero(self.position_value.as_deref()),
            unrealized_pnl: decimal_or_zero(self.unrealized_pnl.as_deref()),
            roe_pct: (decimal_or_zero(self.return_on_equity.as_deref()) * Decimal::ONE_HUNDRED).round_dp(2),
            leverage: leverage_value(self.leverage),
        })
    }
}

impl ApiClearinghouseState {
    pub fn into_wallet_state(self, address: &str) -> WalletState {
        let account_value = decimal_or_zero(
            self.margin_summary
                .as_ref()
                .and_then(|m| m.account_value.as_deref()),
        );
        let positions: Vec<OpenPosition> = self
            .asset_positions
            .into_iter()
            .filter_map(|p| p.position.into_position())
            .collect();
        let unrealized_pnl = positions.iter().map(|p| p.unrealized_pnl).sum();

        WalletState {
            address: address.to_string(),
            account_value,
            unrealized_pnl,
            positions,
        }
    }
}
