use axum::extract::State;
use axum::Json;
use chrono::Utc;

use super::ApiResponse;
use crate::errors::AppError;
use crate::intelligence::{dashboard_summary, wallet_leaderboard, DashboardSummary, LeaderboardRow};
use crate::AppState;

/// GET /api/dashboard/summary
pub async fn summary(State(state): State<AppState>) -> Result<Json<ApiResponse<DashboardSummary>>, AppError> {
    let store = state.engine.store();
    let signals = store.load_signals().await?;
    let wallets = store.load_wallets().await?;

    Ok(Json(ApiResponse::ok(dashboard_summary(
        &signals,
        wallets.len(),
        Utc::now(),
    ))))
}

/// GET /api/performance: wallets ranked by attributed PnL.
pub async fn performance(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<LeaderboardRow>>>, AppError> {
    let wallets = state.engine.store().load_wallets().await?;
    Ok(Json(ApiResponse::ok(wallet_leaderboard(&wallets))))
}
