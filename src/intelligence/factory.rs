use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::cluster::Cluster;
use crate::config::Settings;
use crate::models::{Direction, Signal, SignalStatus};

/// Price-derived figures of a cluster before rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterEconomics {
    /// Σ price·|size| / Σ|size|
    pub entry_price: Decimal,
    /// Σ|size|
    pub size: Decimal,
    /// Σ price·|size| / leverage
    pub margin: Decimal,
    /// Arithmetic mean of per-fill leverage.
    pub leverage: Decimal,
}

pub fn economics(cluster: &Cluster) -> ClusterEconomics {
    let size: Decimal = cluster.fills.iter().map(|f| f.size.abs()).sum();
    let cost: Decimal = cluster.fills.iter().map(|f| f.notional()).sum();
    let margin: Decimal = cluster
        .fills
        .iter()
        .map(|f| f.notional() / f.leverage)
        .sum();

    let entry_price = if size > Decimal::ZERO {
        cost / size
    } else {
        Decimal::ZERO
    };

    let leverage = if cluster.fills.is_empty() {
        Decimal::from(crate::models::fill::DEFAULT_LEVERAGE)
    } else {
        cluster.fills.iter().map(|f| f.leverage).sum::<Decimal>()
            / Decimal::from(cluster.fills.len() as u64)
    };

    ClusterEconomics {
        entry_price,
        size,
        margin,
        leverage,
    }
}

/// One level per target: above entry for longs, below for shorts.
pub fn take_profit_levels(entry: Decimal, direction: Direction, targets_pct: &[Decimal]) -> Vec<Decimal> {
    targets_pct
        .iter()
        .map(|pct| {
            let move_frac = *pct / Decimal::ONE_HUNDRED;
            let level = match direction {
                Direction::Long => entry * (Decimal::ONE + move_frac),
                Direction::Short => entry * (Decimal::ONE - move_frac),
            };
            level.round_dp(4)
        })
        .collect()
}

/// `stop_pct` is signed. With the usual negative value the long stop sits
/// below entry and the short stop above it.
pub fn stop_loss_level(entry: Decimal, direction: Direction, stop_pct: Decimal) -> Decimal {
    let move_frac = stop_pct / Decimal::ONE_HUNDRED;
    let level = match direction {
        Direction::Long => entry * (Decimal::ONE + move_frac),
        Direction::Short => entry * (Decimal::ONE - move_frac),
    };
    level.round_dp(4)
}

/// Build the Open signal for a qualifying cluster.
///
/// `mark_price` seeds the live figures when the venue returned one; without
/// it the signal starts flat at its entry price.
pub fn build_signal(cluster: &Cluster, settings: &Settings, mark_price: Option<Decimal>) -> Signal {
    let econ = economics(cluster);
    let latest_ms = cluster.latest_time_ms();
    let created_at = DateTime::from_timestamp_millis(latest_ms).unwrap_or_else(Utc::now);

    let current_price = mark_price
        .filter(|p| *p > Decimal::ZERO)
        .unwrap_or(econ.entry_price);
    let pnl = (current_price - econ.entry_price) * econ.size * cluster.direction.sign();
    let roi = if econ.margin > Decimal::ZERO {
        pnl / econ.margin * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    Signal {
        id: Signal::make_id(&cluster.instrument, cluster.direction, latest_ms),
        instrument: cluster.instrument.clone(),
        direction: cluster.direction,
        entry_price: econ.entry_price.round_dp(4),
        current_price: current_price.round_dp(4),
        pnl: pnl.round_dp(2),
        roi: roi.round_dp(2),
        status: SignalStatus::Open,
        created_at,
        closed_at: None,
        leverage: econ.leverage.round_dp(2),
        margin: econ.margin.round_dp(2),
        size: econ.size.round_dp(4),
        contributing_wallet_addresses: cluster.wallets(),
        cluster_fills: cluster.fills.clone(),
        take_profit_levels: take_profit_levels(
            econ.entry_price,
            cluster.direction,
            &settings.take_profit_targets,
        ),
        stop_loss_level: stop_loss_level(
            econ.entry_price,
            cluster.direction,
            settings.default_stop_loss_pct,
        ),
    }
}
