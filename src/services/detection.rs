use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use metrics::{counter, gauge, histogram};
use serde::Serialize;
use tokio::time::{interval, Duration};

use super::engine::{PassError, SignalEngine};
use crate::intelligence::{build_signal, cooldown, detect_clusters, CooldownLedger};
use crate::models::{Fill, Signal};
use crate::store::sort_newest_first;

/// What one detection pass did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectionReport {
    /// Set when the pass did nothing because of config or an empty registry.
    pub skipped: Option<String>,
    pub wallets_polled: usize,
    pub fetch_failures: usize,
    pub fills_fetched: usize,
    pub clusters: usize,
    pub duplicates: usize,
    pub created: Vec<String>,
}

impl SignalEngine {
    /// Fetch every tracked wallet's fills, find consensus clusters and
    /// persist the new signals together with the contributors' cooldowns.
    pub async fn run_detection_pass(&self, now: DateTime<Utc>) -> Result<DetectionReport, PassError> {
        let start = Instant::now();
        let _guard = self.writer().await;
        let settings = self.settings().await;
        let mut report = DetectionReport::default();

        let mut wallets = self.store().load_wallets().await?;
        gauge!("tracked_wallets").set(wallets.len() as f64);

        if wallets.is_empty() || !settings.is_runnable() {
            let reason = if wallets.is_empty() {
                "no tracked wallets"
            } else {
                "min wallet count and time window must be positive"
            };
            tracing::info!(reason = reason, "Signal detection skipped");
            report.skipped = Some(reason.to_string());
            return Ok(report);
        }

        // Scatter: one fill request per wallet, all in flight together
        let fetches = wallets.iter().map(|w| {
            let address = w.address.clone();
            async move {
                let result = self.bounded(self.gateway().fills(&address)).await;
                (address, result)
            }
        });

        let mut all_fills: Vec<Fill> = Vec::new();
        for (address, result) in join_all(fetches).await {
            report.wallets_polled += 1;
            match result {
                Ok(fills) => {
                    // Attribute by registry spelling, whatever the venue echoed
                    all_fills.extend(fills.into_iter().map(|mut f| {
                        f.wallet_address = address.clone();
                        f
                    }));
                }
                Err(e) => {
                    report.fetch_failures += 1;
                    counter!("gateway_failures_total").increment(1);
                    tracing::warn!(error = %e, address = %address, "Failed to fetch fills");
                }
            }
        }
        report.fills_fetched = all_fills.len();
        counter!("fills_fetched_total").increment(all_fills.len() as u64);

        let clusters = {
            let ledger = CooldownLedger::new(&wallets);
            detect_clusters(&all_fills, &ledger, now, &settings)
        };
        report.clusters = clusters.len();

        if clusters.is_empty() {
            tracing::info!(
                wallets = report.wallets_polled,
                fills = report.fills_fetched,
                "No new signals detected in this run"
            );
            histogram!("detection_pass_seconds").record(start.elapsed().as_secs_f64());
            return Ok(report);
        }

        let mut signals = self.store().load_signals().await?;
        let mut known_ids: HashSet<String> = signals.iter().map(|s| s.id.clone()).collect();
        let mut created: Vec<Signal> = Vec::new();
        let wallets_before = wallets.clone();

        for cluster in &clusters {
            let id = Signal::make_id(&cluster.instrument, cluster.direction, cluster.latest_time_ms());
            if known_ids.contains(&id) {
                report.duplicates += 1;
                counter!("duplicate_signals_total").increment(1);
                tracing::info!(signal_id = %id, "Signal already recorded, skipping");

                // Contributors are missing their cooldown; restore it from
                // the stored signal.
                if let Some(existing) = signals.iter().find(|s| s.id == id) {
                    cooldown::record(
                        &mut wallets,
                        &existing.contributing_wallet_addresses,
                        &existing.instrument,
                        existing.created_at,
                    );
                }
                continue;
            }

            let mark = match self.bounded(self.gateway().mark_price(&cluster.instrument)).await {
                Ok(price) => price,
                Err(e) => {
                    counter!("gateway_failures_total").increment(1);
                    tracing::warn!(error = %e, instrument = %cluster.instrument, "Failed to fetch mark price");
                    None
                }
            };

            let signal = build_signal(cluster, &settings, mark);
            cooldown::record(
                &mut wallets,
                &signal.contributing_wallet_addresses,
                &signal.instrument,
                now,
            );

            tracing::info!(
                signal_id = %signal.id,
                instrument = %signal.instrument,
                direction = %signal.direction,
                entry = %signal.entry_price,
                margin = %signal.margin,
                wallets = signal.contributing_wallets(),
                "New consensus signal"
            );

            known_ids.insert(signal.id.clone());
            created.push(signal);
        }

        if created.is_empty() {
            if wallets != wallets_before {
                tracing::warn!(
                    duplicates = report.duplicates,
                    "Restoring cooldowns for already recorded signals"
                );
                self.store().replace_wallets(&wallets).await?;
            }
        } else {
            signals.extend(created.iter().cloned());
            sort_newest_first(&mut signals);

            self.store().replace_all(&wallets, &signals).await?;

            counter!("signals_created_total").increment(created.len() as u64);
            gauge!("open_signals").set(signals.iter().filter(|s| s.is_open()).count() as f64);

            for signal in &created {
                self.notify_created(signal);
            }
            report.created = created.into_iter().map(|s| s.id).collect();
        }

        histogram!("detection_pass_seconds").record(start.elapsed().as_secs_f64());
        Ok(report)
    }
}

/// Run the detection pass every `interval_secs`. A failed pass is logged and
/// simply retried on the next tick.
pub async fn run_detection_loop(engine: Arc<SignalEngine>, interval_secs: u64) {
    tracing::info!(interval_secs = interval_secs, "Detection loop started");
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        ticker.tick().await;

        match engine.run_detection_pass(Utc::now()).await {
            Ok(report) if !report.created.is_empty() => {
                tracing::info!(
                    created = report.created.len(),
                    duplicates = report.duplicates,
                    "Detection pass saved new signals"
                );
            }
            Ok(report) => {
                tracing::debug!(
                    fills = report.fills_fetched,
                    clusters = report.clusters,
                    duplicates = report.duplicates,
                    "Detection pass complete"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Detection pass failed");
            }
        }
    }
}
