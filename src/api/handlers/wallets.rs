use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use super::ApiResponse;
use crate::errors::AppError;
use crate::models::{Wallet, WalletState};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddWalletRequest {
    pub address: String,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Wallet>>>, AppError> {
    let wallets = state.engine.store().load_wallets().await?;
    Ok(Json(ApiResponse::ok(wallets)))
}

pub async fn add(
    State(state): State<AppState>,
    Json(body): Json<AddWalletRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Wallet>>), AppError> {
    let wallet = state.engine.add_wallet(&body.address, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(wallet))))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<Wallet>>, AppError> {
    let removed = state.engine.remove_wallet(&address).await?;
    Ok(Json(ApiResponse::ok(removed)))
}

/// GET /api/wallets/:address/state: live positions for any address, tracked or not.
pub async fn account_state(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<WalletState>>, AppError> {
    let address = address.trim();
    if address.is_empty() || address.chars().any(char::is_whitespace) {
        return Err(AppError::BadRequest(format!("invalid wallet address: {address:?}")));
    }

    let engine = &state.engine;
    let wallet_state = engine.bounded(engine.gateway().wallet_state(address)).await?;
    Ok(Json(ApiResponse::ok(wallet_state)))
}
