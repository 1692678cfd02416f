use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_auth;
use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes, no authentication
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes, Bearer token when API_TOKEN is set
    let protected = Router::new()
        // Dashboard
        .route("/api/dashboard/summary", get(handlers::dashboard::summary))
        .route("/api/performance", get(handlers::dashboard::performance))
        // Signals
        .route("/api/signals", get(handlers::signals::list))
        .route(
            "/api/signals/:id",
            get(handlers::signals::detail).delete(handlers::signals::delete),
        )
        // Wallet registry
        .route("/api/wallets", get(handlers::wallets::list).post(handlers::wallets::add))
        .route("/api/wallets/:address", axum::routing::delete(handlers::wallets::remove))
        .route("/api/wallets/:address/state", get(handlers::wallets::account_state))
        // Config
        .route(
            "/api/config",
            get(handlers::config::get_config).put(handlers::config::update_config),
        )
        // Control
        .route("/api/control/detect", post(handlers::control::detect))
        .route("/api/control/valuate", post(handlers::control::valuate))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
