use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::models::Wallet;

/// How long a wallet stays excluded from new signals on an instrument after
/// contributing to one.
pub fn cooldown_period() -> Duration {
    Duration::hours(2)
}

/// Read-only cooldown lookup over a wallet snapshot, keyed by lowercase address.
pub struct CooldownLedger<'a> {
    by_address: HashMap<String, &'a Wallet>,
}

impl<'a> CooldownLedger<'a> {
    pub fn new(wallets: &'a [Wallet]) -> Self {
        let by_address = wallets
            .iter()
            .map(|w| (w.address.to_lowercase(), w))
            .collect();
        Self { by_address }
    }

    /// True while less than [`cooldown_period`] has passed since the wallet
    /// last triggered a signal on `instrument`. Unknown wallets are never on
    /// cooldown.
    pub fn is_on_cooldown(&self, address: &str, instrument: &str, now: DateTime<Utc>) -> bool {
        self.by_address
            .get(&address.to_lowercase())
            .is_some_and(|w| is_on_cooldown(w, instrument, now))
    }
}

pub fn is_on_cooldown(wallet: &Wallet, instrument: &str, now: DateTime<Utc>) -> bool {
    match wallet.cooldowns.get(instrument) {
        Some(started) => now - *started < cooldown_period(),
        None => false,
    }
}

/// Start a cooldown on `instrument` for every wallet in `addresses`.
///
/// A stored timestamp later than `now` is kept, so per-instrument cooldowns
/// never move backwards. Returns the number of wallets touched.
pub fn record(
    wallets: &mut [Wallet],
    addresses: &[String],
    instrument: &str,
    now: DateTime<Utc>,
) -> usize {
    let mut touched = 0;

    for wallet in wallets.iter_mut() {
        if !addresses.iter().any(|a| wallet.matches(a)) {
            continue;
        }

        let entry = wallet.cooldowns.entry(instrument.to_string()).or_insert(now);
        if *entry < now {
            *entry = now;
        }
        touched += 1;
    }

    touched
}
