use std::sync::Arc;
use std::time::Duration;

use consensus_signals::api::router::create_router;
use consensus_signals::config::AppConfig;
use consensus_signals::market::{InfoClient, MarketGateway};
use consensus_signals::metrics::init_metrics;
use consensus_signals::services::{
    run_detection_loop, run_valuation_loop, NotificationSink, SignalEngine, TelegramNotifier,
};
use consensus_signals::store::{JsonFileStore, PgStore, Store};
use consensus_signals::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);
    let metrics_handle = init_metrics()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let store = PgStore::connect(url).await?;
            tracing::info!("Database connected, migrations applied");
            Arc::new(store)
        }
        None => {
            tracing::info!(dir = %config.data_dir.display(), "DATABASE_URL not set, using JSON file store");
            Arc::new(JsonFileStore::new(&config.data_dir))
        }
    };

    let call_timeout = Duration::from_secs(config.gateway_timeout_secs);
    let gateway: Arc<dyn MarketGateway> =
        Arc::new(InfoClient::with_timeout(&config.hyperliquid_api_url, call_timeout)?);

    let notifier: Option<Arc<dyn NotificationSink>> = match &config.telegram_bot_token {
        Some(token) if config.has_telegram() => {
            tracing::info!(channels = config.telegram_channel_ids.len(), "Telegram notifications enabled");
            Some(Arc::new(TelegramNotifier::new(
                token.clone(),
                config.telegram_channel_ids.clone(),
            )))
        }
        _ => {
            tracing::info!("Telegram notifications disabled (TELEGRAM_BOT_TOKEN / TELEGRAM_CHANNEL_IDS not set)");
            None
        }
    };

    // Settings saved through PUT /api/config win over the environment
    let settings = match store.load_settings().await? {
        Some(saved) => {
            tracing::info!(
                min_wallet_count = saved.min_wallet_count,
                time_window_minutes = saved.time_window_minutes,
                "Using detection settings saved at runtime"
            );
            saved
        }
        None => config.settings.clone(),
    };

    if !settings.is_runnable() {
        tracing::warn!(
            min_wallet_count = settings.min_wallet_count,
            time_window_minutes = settings.time_window_minutes,
            "Detection settings are not positive; every detection pass will be a no-op"
        );
    }

    let engine = Arc::new(SignalEngine::new(store, gateway, notifier, settings, call_timeout));

    // --- Background passes ---
    if config.detection_enabled {
        let engine = Arc::clone(&engine);
        let interval = config.wallet_poll_interval_secs;
        tokio::spawn(async move {
            run_detection_loop(engine, interval).await;
        });
    } else {
        tracing::info!("Detection loop disabled (DETECTION_ENABLED=false)");
    }

    if config.valuation_enabled {
        let engine = Arc::clone(&engine);
        let interval = config.price_poll_interval_secs;
        tokio::spawn(async move {
            run_valuation_loop(engine, interval).await;
        });
    } else {
        tracing::info!("Valuation loop disabled (VALUATION_ENABLED=false)");
    }

    let state = AppState {
        engine,
        config,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();
}
