use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::cooldown::CooldownLedger;
use crate::config::Settings;
use crate::models::{Direction, Fill};

/// Fills from distinct wallets that opened the same position inside one
/// window. Fills are kept in ascending time order.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub instrument: String,
    pub direction: Direction,
    pub fills: Vec<Fill>,
}

impl Cluster {
    /// Unique wallet addresses, sorted. Addresses differing only in case
    /// count once; the first spelling seen is kept.
    pub fn wallets(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut wallets: Vec<String> = self
            .fills
            .iter()
            .filter(|f| seen.insert(f.wallet_address.to_lowercase()))
            .map(|f| f.wallet_address.clone())
            .collect();
        wallets.sort();
        wallets
    }

    pub fn wallet_count(&self) -> usize {
        distinct_wallets(&self.fills)
    }

    /// Σ price × |size|.
    pub fn volume(&self) -> Decimal {
        self.fills.iter().map(Fill::notional).sum()
    }

    pub fn latest_time_ms(&self) -> i64 {
        self.fills.iter().map(|f| f.time_ms).max().unwrap_or_default()
    }
}

fn distinct_wallets(fills: &[Fill]) -> usize {
    fills
        .iter()
        .map(|f| f.wallet_address.to_lowercase())
        .collect::<HashSet<_>>()
        .len()
}

// ---------------------------------------------------------------------------
// Step 1: eligibility
// ---------------------------------------------------------------------------

/// Keep recent opening fills from wallets that are not cooling down on the
/// fill's instrument.
pub fn eligible_fills(
    fills: &[Fill],
    ledger: &CooldownLedger<'_>,
    now: DateTime<Utc>,
    window_ms: i64,
) -> Vec<Fill> {
    let now_ms = now.timestamp_millis();

    fills
        .iter()
        .filter(|f| now_ms - f.time_ms < window_ms)
        .filter(|f| f.is_opening())
        .filter(|f| !ledger.is_on_cooldown(&f.wallet_address, &f.instrument, now))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Step 2: grouping
// ---------------------------------------------------------------------------

/// Partition by (instrument, direction). The map order makes every pass
/// visit groups deterministically.
pub fn group_by_position(fills: Vec<Fill>) -> BTreeMap<(String, Direction), Vec<Fill>> {
    let mut groups: BTreeMap<(String, Direction), Vec<Fill>> = BTreeMap::new();
    for fill in fills {
        groups
            .entry((fill.instrument.clone(), fill.direction()))
            .or_default()
            .push(fill);
    }
    groups
}

// ---------------------------------------------------------------------------
// Step 3: best window
// ---------------------------------------------------------------------------

/// Anchor a window of `window_ms` on every fill and return the fills of the
/// window with the most distinct wallets. Ties keep the earliest anchor.
///
/// `fills` must already be sorted by time. Quadratic in the group size,
/// which stays small because only the last `window_ms` of fills survive the
/// eligibility filter.
pub fn best_window(fills: &[Fill], window_ms: i64) -> Option<Vec<Fill>> {
    let mut best: Option<(usize, Vec<Fill>)> = None;

    for anchor in fills {
        let end = anchor.time_ms + window_ms;
        let window: Vec<Fill> = fills
            .iter()
            .filter(|f| f.time_ms >= anchor.time_ms && f.time_ms < end)
            .cloned()
            .collect();
        let count = distinct_wallets(&window);

        let better = match &best {
            Some((best_count, _)) => count > *best_count,
            None => true,
        };
        if better {
            best = Some((count, window));
        }
    }

    best.map(|(_, window)| window)
}

// ---------------------------------------------------------------------------
// Step 4: full detection
// ---------------------------------------------------------------------------

/// Run eligibility, grouping, window search and the N / volume thresholds.
/// Returns only qualifying clusters, in (instrument, direction) order.
pub fn detect_clusters(
    fills: &[Fill],
    ledger: &CooldownLedger<'_>,
    now: DateTime<Utc>,
    settings: &Settings,
) -> Vec<Cluster> {
    let window_ms = settings.time_window_ms();
    let eligible = eligible_fills(fills, ledger, now, window_ms);

    if eligible.is_empty() {
        tracing::debug!("No recent opening fills outside cooldown");
        return Vec::new();
    }

    let min_wallets = usize::try_from(settings.min_wallet_count).unwrap_or(usize::MAX);
    let mut clusters = Vec::new();

    for ((instrument, direction), mut group) in group_by_position(eligible) {
        group.sort_by_key(|f| f.time_ms);

        let Some(window) = best_window(&group, window_ms) else {
            continue;
        };

        let cluster = Cluster {
            instrument,
            direction,
            fills: window,
        };

        let wallet_count = cluster.wallet_count();
        let volume = cluster.volume();

        if wallet_count < min_wallets || volume < settings.min_volume {
            tracing::debug!(
                instrument = %cluster.instrument,
                direction = %cluster.direction,
                wallets = wallet_count,
                volume = %volume,
                "Best window below threshold"
            );
            continue;
        }

        tracing::info!(
            instrument = %cluster.instrument,
            direction = %cluster.direction,
            wallets = wallet_count,
            volume = %volume,
            "Consensus cluster found"
        );
        clusters.push(cluster);
    }

    clusters
}
