use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Direction, Signal, SignalStatus, Wallet};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Months shown in the win-rate series, current month included.
const SERIES_MONTHS: i32 = 6;
const RECENT_SIGNALS: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyWinRate {
    pub month: String,
    pub win_rate: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecentSignal {
    pub id: String,
    pub instrument: String,
    pub direction: Direction,
    pub pnl: Decimal,
    pub status: SignalStatus,
    pub contributing_wallets: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardSummary {
    /// Unrealized PnL summed over open signals.
    pub open_pnl: Decimal,
    /// `open_pnl` as a percent of open margin.
    pub open_roi: Decimal,
    /// Take-profit share of closed signals, percent.
    pub win_rate: Decimal,
    pub closed_signals: usize,
    pub take_profit: usize,
    pub stop_loss: usize,
    pub active_signals: usize,
    pub tracked_wallets: usize,
    pub recent_signals: Vec<RecentSignal>,
    pub monthly_win_rate: Vec<MonthlyWinRate>,
}

fn percent(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(part as u64) / Decimal::from(whole as u64) * Decimal::ONE_HUNDRED
}

/// Aggregate the persisted collections for the dashboard. `signals` are
/// expected newest first, as the store returns them.
pub fn dashboard_summary(signals: &[Signal], tracked_wallets: usize, now: DateTime<Utc>) -> DashboardSummary {
    let mut open_pnl = Decimal::ZERO;
    let mut open_margin = Decimal::ZERO;
    let mut active = 0usize;
    let mut tp = 0usize;
    let mut sl = 0usize;
    // (year, month0) -> (tp, sl)
    let mut monthly: HashMap<(i32, u32), (usize, usize)> = HashMap::new();

    for signal in signals {
        match signal.status {
            SignalStatus::Open => {
                active += 1;
                open_pnl += signal.pnl;
                open_margin += signal.margin;
            }
            SignalStatus::TakeProfit | SignalStatus::StopLoss => {
                let key = (signal.created_at.year(), signal.created_at.month0());
                let bucket = monthly.entry(key).or_default();
                if signal.status == SignalStatus::TakeProfit {
                    tp += 1;
                    bucket.0 += 1;
                } else {
                    sl += 1;
                    bucket.1 += 1;
                }
            }
        }
    }

    let open_roi = if open_margin > Decimal::ZERO {
        (open_pnl / open_margin * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    };

    let current = now.year() * 12 + now.month0() as i32;
    let monthly_win_rate = (0..SERIES_MONTHS)
        .rev()
        .map(|back| {
            let idx = current - back;
            let key = (idx.div_euclid(12), idx.rem_euclid(12) as u32);
            let (m_tp, m_sl) = monthly.get(&key).copied().unwrap_or_default();
            MonthlyWinRate {
                month: MONTH_NAMES[key.1 as usize].to_string(),
                win_rate: percent(m_tp, m_tp + m_sl).round_dp(1),
            }
        })
        .collect();

    let recent_signals = signals
        .iter()
        .take(RECENT_SIGNALS)
        .map(|s| RecentSignal {
            id: s.id.clone(),
            instrument: s.instrument.clone(),
            direction: s.direction,
            pnl: s.pnl,
            status: s.status,
            contributing_wallets: s.contributing_wallets(),
        })
        .collect();

    DashboardSummary {
        open_pnl,
        open_roi,
        win_rate: percent(tp, tp + sl).round_dp(2),
        closed_signals: tp + sl,
        take_profit: tp,
        stop_loss: sl,
        active_signals: active,
        tracked_wallets,
        recent_signals,
        monthly_win_rate,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub address: String,
    pub success_rate: Decimal,
    pub pnl: Decimal,
    pub trades: u32,
}

/// Rank wallets by attributed PnL, best first. Equal PnL ranks by address.
pub fn wallet_leaderboard(wallets: &[Wallet]) -> Vec<LeaderboardRow> {
    let mut sorted: Vec<&Wallet> = wallets.iter().collect();
    sorted.sort_by(|a, b| b.total_pnl.cmp(&a.total_pnl).then_with(|| a.address.cmp(&b.address)));

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, w)| LeaderboardRow {
            rank: i + 1,
            address: w.address.clone(),
            success_rate: w.success_rate().round_dp(2),
            pnl: w.total_pnl.round_dp(2),
            trades: w.total_trades,
        })
        .collect()
}
