use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    // Pre-register counters so they appear even before the first increment.
    counter!("fills_fetched_total").absolute(0);
    counter!("gateway_failures_total").absolute(0);
    counter!("signals_created_total").absolute(0);
    counter!("duplicate_signals_total").absolute(0);
    counter!("signals_closed_total", "status" => "TP").absolute(0);
    counter!("signals_closed_total", "status" => "SL").absolute(0);

    gauge!("tracked_wallets").set(0.0);
    gauge!("open_signals").set(0.0);

    // Histograms are lazily created on first record; force creation.
    histogram!("detection_pass_seconds").record(0.0);
    histogram!("valuation_pass_seconds").record(0.0);

    Ok(handle)
}
