use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::config::Settings;
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfig {
    pub min_wallet_count: i64,
    pub time_window_minutes: i64,
    pub min_volume: Decimal,
    pub default_stop_loss_pct: Decimal,
    pub take_profit_targets: Vec<Decimal>,
    pub detection_enabled: bool,
    pub valuation_enabled: bool,
    pub wallet_poll_interval_secs: u64,
    pub price_poll_interval_secs: u64,
    pub gateway_timeout_secs: u64,
    pub notifications_enabled: bool,
    pub persistence: &'static str,
}

/// GET /api/config: settings the engine is running with. Secrets are never echoed.
pub async fn get_config(State(state): State<AppState>) -> Json<ApiResponse<EffectiveConfig>> {
    let c = &state.config;
    let s = state.engine.settings().await;

    Json(ApiResponse::ok(EffectiveConfig {
        min_wallet_count: s.min_wallet_count,
        time_window_minutes: s.time_window_minutes,
        min_volume: s.min_volume,
        default_stop_loss_pct: s.default_stop_loss_pct,
        take_profit_targets: s.take_profit_targets,
        detection_enabled: c.detection_enabled,
        valuation_enabled: c.valuation_enabled,
        wallet_poll_interval_secs: c.wallet_poll_interval_secs,
        price_poll_interval_secs: c.price_poll_interval_secs,
        gateway_timeout_secs: c.gateway_timeout_secs,
        notifications_enabled: c.has_telegram(),
        persistence: if c.database_url.is_some() { "postgres" } else { "json" },
    }))
}

/// Body of PUT /api/config. Omitted fields keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsUpdate {
    pub min_wallet_count: Option<i64>,
    pub time_window_minutes: Option<i64>,
    pub min_volume: Option<Decimal>,
    pub default_stop_loss_pct: Option<Decimal>,
    pub take_profit_targets: Option<Vec<Decimal>>,
}

impl SettingsUpdate {
    fn merge_into(self, current: Settings) -> Settings {
        Settings {
            min_wallet_count: self.min_wallet_count.unwrap_or(current.min_wallet_count),
            time_window_minutes: self.time_window_minutes.unwrap_or(current.time_window_minutes),
            min_volume: self.min_volume.unwrap_or(current.min_volume),
            default_stop_loss_pct: self.default_stop_loss_pct.unwrap_or(current.default_stop_loss_pct),
            take_profit_targets: self.take_profit_targets.unwrap_or(current.take_profit_targets),
        }
    }
}

/// PUT /api/config: change detection settings. Takes effect from the next pass.
pub async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<ApiResponse<Settings>>, AppError> {
    let saved = state
        .engine
        .update_settings(|current| update.merge_into(current))
        .await?;
    Ok(Json(ApiResponse::ok(saved)))
}
