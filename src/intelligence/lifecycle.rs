use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::{Direction, Signal, SignalStatus};

/// Status an Open signal should move to at `price`. Stop-loss is checked
/// first, so it wins when both levels are crossed at once.
pub fn next_status(
    direction: Direction,
    price: Decimal,
    stop_loss: Decimal,
    take_profits: &[Decimal],
) -> SignalStatus {
    match direction {
        Direction::Long => {
            if price <= stop_loss {
                SignalStatus::StopLoss
            } else if take_profits.iter().any(|tp| price >= *tp) {
                SignalStatus::TakeProfit
            } else {
                SignalStatus::Open
            }
        }
        Direction::Short => {
            if price >= stop_loss {
                SignalStatus::StopLoss
            } else if take_profits.iter().any(|tp| price <= *tp) {
                SignalStatus::TakeProfit
            } else {
                SignalStatus::Open
            }
        }
    }
}

/// Mark-to-market PnL and ROI (percent of margin) of a signal at `price`.
pub fn mark_to_market(signal: &Signal, price: Decimal) -> (Decimal, Decimal) {
    let pnl = (price - signal.entry_price) * signal.size * signal.direction.sign();
    let roi = if signal.margin > Decimal::ZERO {
        pnl / signal.margin * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };
    (pnl.round_dp(2), roi.round_dp(2))
}

/// Outcome of one valuation tick for one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Terminal signal or unusable price; nothing changed.
    Skipped,
    /// Price, PnL and ROI refreshed; still Open.
    Updated,
    /// Refreshed and moved to a terminal status on this tick.
    Closed(SignalStatus),
}

/// Apply one mark price to a signal in place.
///
/// Terminal signals are never touched again, which is what makes the
/// `Closed` outcome (and the attribution hanging off it) happen once.
pub fn apply_price(signal: &mut Signal, price: Decimal, now: DateTime<Utc>) -> Tick {
    if signal.status.is_terminal() || price <= Decimal::ZERO {
        return Tick::Skipped;
    }

    let status = next_status(
        signal.direction,
        price,
        signal.stop_loss_level,
        &signal.take_profit_levels,
    );
    let (pnl, roi) = mark_to_market(signal, price);

    signal.current_price = price.round_dp(4);
    signal.pnl = pnl;
    signal.roi = roi;

    if status.is_terminal() {
        signal.status = status;
        signal.closed_at = Some(now);
        Tick::Closed(status)
    } else {
        Tick::Updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_signal(direction: Direction) -> Signal {
        let (sl, tps) = match direction {
            Direction::Long => (48_750, vec![51_000, 52_500]),
            Direction::Short => (51_250, vec![49_000, 47_500]),
        };
        Signal {
            id: format!("BTC|{direction}|1"),
            instrument: "BTC".into(),
            direction,
            entry_price: Decimal::from(50_000),
            current_price: Decimal::from(50_000),
            pnl: Decimal::ZERO,
            roi: Decimal::ZERO,
            status: SignalStatus::Open,
            created_at: Utc::now(),
            closed_at: None,
            leverage: Decimal::from(10),
            margin: Decimal::from(30_000),
            size: Decimal::from(6),
            contributing_wallet_addresses: vec![],
            cluster_fills: vec![],
            take_profit_levels: tps.into_iter().map(Decimal::from).collect(),
            stop_loss_level: Decimal::from(sl),
        }
    }

    #[test]
    fn test_long_take_profit() {
        let mut s = open_signal(Direction::Long);
        let tick = apply_price(&mut s, Decimal::from(51_200), Utc::now());

        assert_eq!(tick, Tick::Closed(SignalStatus::TakeProfit));
        assert_eq!(s.status, SignalStatus::TakeProfit);
        assert_eq!(s.pnl, Decimal::from(7_200));
        assert_eq!(s.roi, Decimal::from(24));
        assert_eq!(s.current_price, Decimal::from(51_200));
        assert!(s.closed_at.is_some());
    }

    #[test]
    fn test_long_stop_loss_and_open() {
        let mut s = open_signal(Direction::Long);
        assert_eq!(apply_price(&mut s, Decimal::from(50_500), Utc::now()), Tick::Updated);
        assert_eq!(s.status, SignalStatus::Open);
        assert_eq!(s.pnl, Decimal::from(3_000));

        assert_eq!(
            apply_price(&mut s, Decimal::from(48_750), Utc::now()),
            Tick::Closed(SignalStatus::StopLoss)
        );
        assert_eq!(s.pnl, Decimal::from(-7_500));
        assert_eq!(s.roi, Decimal::from(-25));
    }

    #[test]
    fn test_short_transitions() {
        let mut s = open_signal(Direction::Short);
        assert_eq!(
            apply_price(&mut s, Decimal::from(49_000), Utc::now()),
            Tick::Closed(SignalStatus::TakeProfit)
        );
        assert_eq!(s.pnl, Decimal::from(6_000));

        let mut s = open_signal(Direction::Short);
        assert_eq!(
            apply_price(&mut s, Decimal::from(51_300), Utc::now()),
            Tick::Closed(SignalStatus::StopLoss)
        );
        assert_eq!(s.pnl, Decimal::from(-7_800));
    }

    #[test]
    fn test_stop_loss_wins_when_both_cross() {
        // Misconfigured levels where one price crosses both
        let status = next_status(
            Direction::Long,
            Decimal::from(100),
            Decimal::from(100),
            &[Decimal::from(90)],
        );
        assert_eq!(status, SignalStatus::StopLoss);
    }

    #[test]
    fn test_terminal_is_absorbing() {
        let mut s = open_signal(Direction::Long);
        apply_price(&mut s, Decimal::from(52_000), Utc::now());
        let snapshot = s.clone();

        assert_eq!(apply_price(&mut s, Decimal::from(40_000), Utc::now()), Tick::Skipped);
        assert_eq!(s, snapshot);
    }

    #[test]
    fn test_zero_price_is_skipped() {
        let mut s = open_signal(Direction::Long);
        let snapshot = s.clone();
        assert_eq!(apply_price(&mut s, Decimal::ZERO, Utc::now()), Tick::Skipped);
        assert_eq!(s, snapshot);
    }

    #[test]
    fn test_zero_margin_roi() {
        let mut s = open_signal(Direction::Long);
        s.margin = Decimal::ZERO;
        let (_, roi) = mark_to_market(&s, Decimal::from(50_100));
        assert_eq!(roi, Decimal::ZERO);
    }
}
