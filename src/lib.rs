pub mod api;
pub mod config;
pub mod errors;
pub mod intelligence;
pub mod market;
pub mod metrics;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::SignalEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SignalEngine>,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
