use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::config::Settings;
use crate::market::{GatewayError, MarketGateway};
use crate::models::Signal;
use crate::services::notifier::NotificationSink;
use crate::store::{Store, StoreError};

/// A pass failed to persist its result. The pass is dropped as a whole and
/// the next scheduled run starts again from the stored state.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("persistence failed: {0}")]
    Store(#[from] StoreError),
}

/// Owns the collaborators shared by the detection pass, the valuation pass
/// and the registry operations.
///
/// All store writes in this process go through [`SignalEngine::writer`], so
/// passes and API mutations never interleave their read-modify-write cycles.
pub struct SignalEngine {
    store: Arc<dyn Store>,
    gateway: Arc<dyn MarketGateway>,
    notifier: Option<Arc<dyn NotificationSink>>,
    settings: RwLock<Settings>,
    call_timeout: Duration,
    writer: Mutex<()>,
}

impl SignalEngine {
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn MarketGateway>,
        notifier: Option<Arc<dyn NotificationSink>>,
        settings: Settings,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
            settings: RwLock::new(settings),
            call_timeout,
            writer: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn gateway(&self) -> &Arc<dyn MarketGateway> {
        &self.gateway
    }

    /// Copy of the current detection settings.
    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    pub(super) async fn swap_settings(&self, settings: Settings) -> Settings {
        std::mem::replace(&mut *self.settings.write().await, settings)
    }

    /// Exclusive write access to the store for one read-modify-write cycle.
    pub async fn writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    /// Run a gateway call under the per-call timeout.
    pub async fn bounded<T, F>(&self, call: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.call_timeout.as_secs())),
        }
    }

    /// Hand a freshly persisted signal to the sink without waiting on it.
    pub fn notify_created(&self, signal: &Signal) {
        let Some(sink) = self.notifier.as_ref().map(Arc::clone) else {
            tracing::debug!(signal_id = %signal.id, "No notification sink configured");
            return;
        };

        let signal = signal.clone();
        tokio::spawn(async move {
            sink.notify(&signal).await;
        });
    }
}
