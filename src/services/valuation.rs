use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use metrics::{counter, gauge, histogram};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::time::{interval, Duration};

use super::engine::{PassError, SignalEngine};
use crate::intelligence::{apply_price, apply_to_wallets, Tick};
use crate::models::SignalStatus;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValuationReport {
    pub open_signals: usize,
    pub instruments: usize,
    pub price_failures: usize,
    pub updated: usize,
    pub take_profit: Vec<String>,
    pub stop_loss: Vec<String>,
}

impl ValuationReport {
    pub fn closed(&self) -> usize {
        self.take_profit.len() + self.stop_loss.len()
    }
}

impl SignalEngine {
    /// Re-price every open signal, close those that crossed a level and
    /// credit the closed PnL to the contributing wallets.
    pub async fn run_valuation_pass(&self, now: DateTime<Utc>) -> Result<ValuationReport, PassError> {
        let start = Instant::now();
        let _guard = self.writer().await;
        let mut report = ValuationReport::default();

        let mut signals = self.store().load_signals().await?;
        let instruments: BTreeSet<String> = signals
            .iter()
            .filter(|s| s.is_open())
            .map(|s| s.instrument.clone())
            .collect();

        report.open_signals = signals.iter().filter(|s| s.is_open()).count();
        report.instruments = instruments.len();

        if instruments.is_empty() {
            tracing::debug!("No open signals to value");
            gauge!("open_signals").set(0.0);
            return Ok(report);
        }

        // One price lookup per instrument, shared by every open signal on it
        let lookups = instruments.into_iter().map(|instrument| async move {
            let result = self.bounded(self.gateway().mark_price(&instrument)).await;
            (instrument, result)
        });

        let mut prices: HashMap<String, Decimal> = HashMap::new();
        for (instrument, result) in join_all(lookups).await {
            match result {
                Ok(Some(price)) => {
                    prices.insert(instrument, price);
                }
                Ok(None) => {
                    tracing::debug!(instrument = %instrument, "No mark price available");
                }
                Err(e) => {
                    report.price_failures += 1;
                    counter!("gateway_failures_total").increment(1);
                    tracing::warn!(error = %e, instrument = %instrument, "Failed to fetch mark price");
                }
            }
        }

        let mut wallets = self.store().load_wallets().await?;

        for signal in signals.iter_mut().filter(|s| s.is_open()) {
            let Some(price) = prices.get(&signal.instrument).copied() else {
                continue;
            };

            match apply_price(signal, price, now) {
                Tick::Skipped => {}
                Tick::Updated => report.updated += 1,
                Tick::Closed(status) => {
                    report.updated += 1;
                    let credited = apply_to_wallets(&mut wallets, signal);
                    counter!("signals_closed_total", "status" => status.as_str()).increment(1);

                    tracing::info!(
                        signal_id = %signal.id,
                        status = %status.as_str(),
                        price = %price,
                        pnl = %signal.pnl,
                        roi = %signal.roi,
                        credited = %credited,
                        "Signal closed"
                    );

                    match status {
                        SignalStatus::TakeProfit => report.take_profit.push(signal.id.clone()),
                        _ => report.stop_loss.push(signal.id.clone()),
                    }
                }
            }
        }

        // A closed signal and its wallet credit land together or not at all
        if report.closed() > 0 {
            self.store().replace_all(&wallets, &signals).await?;
        } else if report.updated > 0 {
            self.store().replace_signals(&signals).await?;
        }

        gauge!("open_signals").set(signals.iter().filter(|s| s.is_open()).count() as f64);
        histogram!("valuation_pass_seconds").record(start.elapsed().as_secs_f64());
        Ok(report)
    }
}

/// Run the valuation pass every `interval_secs`.
pub async fn run_valuation_loop(engine: Arc<SignalEngine>, interval_secs: u64) {
    tracing::info!(interval_secs = interval_secs, "Valuation loop started");
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        ticker.tick().await;

        match engine.run_valuation_pass(Utc::now()).await {
            Ok(report) if report.closed() > 0 => {
                tracing::info!(
                    take_profit = report.take_profit.len(),
                    stop_loss = report.stop_loss.len(),
                    "Valuation pass closed signals"
                );
            }
            Ok(report) => {
                tracing::debug!(
                    open = report.open_signals,
                    updated = report.updated,
                    "Valuation pass complete"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Valuation pass failed");
            }
        }
    }
}
