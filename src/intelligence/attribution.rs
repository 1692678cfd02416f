use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::{Signal, SignalStatus, Wallet};

/// PnL share of one contributing wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    pub address: String,
    pub pnl: Decimal,
}

/// Split `signal.pnl` across its contributors.
///
/// Shares follow each wallet's |size| in the cluster snapshot. Signals with
/// no usable snapshot fall back to an equal split over the contributing
/// addresses. One entry per wallet, ordered by lowercase address.
pub fn attribute(signal: &Signal) -> Vec<Attribution> {
    let total_size: Decimal = signal.cluster_fills.iter().map(|f| f.size.abs()).sum();

    // lowercase address -> (first spelling seen, pnl)
    let mut shares: BTreeMap<String, (String, Decimal)> = BTreeMap::new();

    if total_size > Decimal::ZERO {
        for fill in &signal.cluster_fills {
            let share = signal.pnl * fill.size.abs() / total_size;
            shares
                .entry(fill.wallet_address.to_lowercase())
                .or_insert_with(|| (fill.wallet_address.clone(), Decimal::ZERO))
                .1 += share;
        }
    } else if !signal.contributing_wallet_addresses.is_empty() {
        let each = signal.pnl / Decimal::from(signal.contributing_wallet_addresses.len() as u64);
        for address in &signal.contributing_wallet_addresses {
            shares
                .entry(address.to_lowercase())
                .or_insert_with(|| (address.clone(), Decimal::ZERO))
                .1 += each;
        }
    }

    shares
        .into_values()
        .map(|(address, pnl)| Attribution { address, pnl })
        .collect()
}

/// Credit a closed signal to the wallet registry. Every contributor gets one
/// more trade, plus a win when the signal hit take-profit. Returns the total
/// PnL actually credited; contributors no longer tracked are skipped.
pub fn apply_to_wallets(wallets: &mut [Wallet], signal: &Signal) -> Decimal {
    let won = signal.status == SignalStatus::TakeProfit;
    let mut credited = Decimal::ZERO;

    for share in attribute(signal) {
        let Some(wallet) = wallets.iter_mut().find(|w| w.matches(&share.address)) else {
            tracing::debug!(
                address = %share.address,
                signal_id = %signal.id,
                "Contributor no longer tracked, share dropped"
            );
            continue;
        };

        wallet.total_pnl += share.pnl;
        wallet.total_trades += 1;
        if won {
            wallet.winning_trades += 1;
        }
        credited += share.pnl;
    }

    credited
}
