use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_HYPERLIQUID_URL: &str = "https://api.hyperliquid.xyz";
const DEFAULT_TAKE_PROFIT_TARGETS: &str = "2.0, 3.5, 5.0";

/// Longest accepted detection window (one week).
pub const MAX_TIME_WINDOW_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("minWalletCount must be at least 1, got {0}")]
    MinWalletCount(i64),

    #[error("timeWindowMinutes must be between 1 and 10080, got {0}")]
    TimeWindow(i64),

    #[error("minVolume must not be negative, got {0}")]
    MinVolume(Decimal),

    #[error("takeProfitTargets must not be empty")]
    NoTakeProfitTargets,

    #[error("take profit target must be positive, got {0}")]
    TakeProfitTarget(Decimal),

    #[error("defaultStopLossPct must be between -100 and 0, got {0}")]
    StopLoss(Decimal),
}

/// Knobs consumed by the detection pass. Each pass takes its own copy at the
/// start, so an update lands on the next pass only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Minimum distinct wallets in a window (N).
    pub min_wallet_count: i64,
    /// Window length in minutes (T).
    pub time_window_minutes: i64,
    /// Minimum Σ price × |size| over the window.
    pub min_volume: Decimal,
    /// Signed percent; negative values put the stop on the losing side.
    pub default_stop_loss_pct: Decimal,
    pub take_profit_targets: Vec<Decimal>,
}

impl Settings {
    pub fn time_window_ms(&self) -> i64 {
        self.time_window_minutes.saturating_mul(60_000)
    }

    /// Checks applied to settings changed at runtime. Environment settings
    /// are not held to these: a non-positive N or T there just disables
    /// detection.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.min_wallet_count < 1 {
            return Err(SettingsError::MinWalletCount(self.min_wallet_count));
        }
        if !(1..=MAX_TIME_WINDOW_MINUTES).contains(&self.time_window_minutes) {
            return Err(SettingsError::TimeWindow(self.time_window_minutes));
        }
        if self.min_volume < Decimal::ZERO {
            return Err(SettingsError::MinVolume(self.min_volume));
        }
        if self.take_profit_targets.is_empty() {
            return Err(SettingsError::NoTakeProfitTargets);
        }
        if let Some(bad) = self.take_profit_targets.iter().find(|t| **t <= Decimal::ZERO) {
            return Err(SettingsError::TakeProfitTarget(*bad));
        }
        if self.default_stop_loss_pct > Decimal::ZERO || self.default_stop_loss_pct <= -Decimal::ONE_HUNDRED {
            return Err(SettingsError::StopLoss(self.default_stop_loss_pct));
        }
        Ok(())
    }

    /// Detection only runs with a positive wallet count and window.
    pub fn is_runnable(&self) -> bool {
        self.min_wallet_count > 0 && self.time_window_minutes > 0
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_wallet_count: 5,
            time_window_minutes: 10,
            min_volume: Decimal::from(1_000),
            default_stop_loss_pct: Decimal::new(-25, 1),
            take_profit_targets: parse_decimal_list(DEFAULT_TAKE_PROFIT_TARGETS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    // Persistence: Postgres when DATABASE_URL is set, JSON files otherwise
    pub database_url: Option<String>,
    pub data_dir: PathBuf,

    // Market data
    pub hyperliquid_api_url: String,
    pub gateway_timeout_secs: u64,

    // Pass cadence
    pub detection_enabled: bool,
    pub valuation_enabled: bool,
    pub wallet_poll_interval_secs: u64,
    pub price_poll_interval_secs: u64,

    // Notifications (optional)
    pub telegram_bot_token: Option<String>,
    pub telegram_channel_ids: Vec<String>,

    /// Bearer token for `/api/*`. Unset disables auth.
    pub api_token: Option<String>,

    pub settings: Settings,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Settings::default();

        let settings = Settings {
            min_wallet_count: parse_env("MIN_WALLET_COUNT", defaults.min_wallet_count),
            time_window_minutes: capped_window(parse_env(
                "TIME_WINDOW_MINUTES",
                defaults.time_window_minutes,
            )),
            min_volume: parse_env("MIN_VOLUME", defaults.min_volume),
            default_stop_loss_pct: parse_env(
                "DEFAULT_STOP_LOSS_PCT",
                defaults.default_stop_loss_pct,
            ),
            take_profit_targets: env::var("TAKE_PROFIT_TARGETS")
                .map(|raw| parse_decimal_list(&raw))
                .unwrap_or(defaults.take_profit_targets),
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            data_dir: env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data".into())
                .into(),

            hyperliquid_api_url: env::var("HYPERLIQUID_API_URL")
                .unwrap_or_else(|_| DEFAULT_HYPERLIQUID_URL.into()),
            gateway_timeout_secs: at_least_one(
                "GATEWAY_TIMEOUT_SECS",
                parse_env("GATEWAY_TIMEOUT_SECS", 10),
            ),

            detection_enabled: parse_env("DETECTION_ENABLED", true),
            valuation_enabled: parse_env("VALUATION_ENABLED", true),
            wallet_poll_interval_secs: at_least_one(
                "WALLET_POLL_INTERVAL_SECS",
                parse_env("WALLET_POLL_INTERVAL_SECS", 60),
            ),
            price_poll_interval_secs: at_least_one(
                "PRICE_POLL_INTERVAL_SECS",
                parse_env("PRICE_POLL_INTERVAL_SECS", 30),
            ),

            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok().filter(|s| !s.is_empty()),
            telegram_channel_ids: split_list(&env::var("TELEGRAM_CHANNEL_IDS").unwrap_or_default()),

            api_token: env::var("API_TOKEN").ok().filter(|s| !s.is_empty()),

            settings,
        })
    }

    /// Returns true if a bot token and at least one channel are configured.
    pub fn has_telegram(&self) -> bool {
        self.telegram_bot_token.is_some() && !self.telegram_channel_ids.is_empty()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key = key, value = %raw, "Unparseable config value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Intervals and timeouts of zero are raised to one second.
fn at_least_one(key: &str, secs: u64) -> u64 {
    if secs == 0 {
        tracing::warn!(key = key, "Zero seconds is not allowed, using 1");
        return 1;
    }
    secs
}

fn capped_window(minutes: i64) -> i64 {
    if minutes > MAX_TIME_WINDOW_MINUTES {
        tracing::warn!(
            minutes = minutes,
            max = MAX_TIME_WINDOW_MINUTES,
            "TIME_WINDOW_MINUTES too large, capping"
        );
        return MAX_TIME_WINDOW_MINUTES;
    }
    minutes
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a comma separated list such as `"2.0, 3.5, 5.0"`, skipping junk.
pub fn parse_decimal_list(raw: &str) -> Vec<Decimal> {
    split_list(raw)
        .iter()
        .filter_map(|s| s.parse::<Decimal>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_list() {
        assert_eq!(
            parse_decimal_list("2.0, 3.5 ,5"),
            vec![Decimal::new(20, 1), Decimal::new(35, 1), Decimal::from(5)]
        );
        assert_eq!(parse_decimal_list("1, abc, ,2"), vec![Decimal::ONE, Decimal::TWO]);
        assert!(parse_decimal_list("").is_empty());
    }

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.is_runnable());
        assert_eq!(s.time_window_ms(), 600_000);
        assert_eq!(s.default_stop_loss_pct, Decimal::new(-25, 1));
        assert_eq!(s.take_profit_targets.len(), 3);
    }

    #[test]
    fn test_zero_intervals_raised() {
        assert_eq!(at_least_one("WALLET_POLL_INTERVAL_SECS", 0), 1);
        assert_eq!(at_least_one("WALLET_POLL_INTERVAL_SECS", 45), 45);
    }

    #[test]
    fn test_window_capped_and_overflow_safe() {
        assert_eq!(capped_window(i64::MAX), MAX_TIME_WINDOW_MINUTES);
        assert_eq!(capped_window(-3), -3);
        assert_eq!(capped_window(10), 10);

        let s = Settings {
            time_window_minutes: i64::MAX,
            ..Settings::default()
        };
        assert_eq!(s.time_window_ms(), i64::MAX);
    }

    #[test]
    fn test_validate() {
        assert_eq!(Settings::default().validate(), Ok(()));

        let bad = |f: fn(&mut Settings)| {
            let mut s = Settings::default();
            f(&mut s);
            s.validate().unwrap_err()
        };
        assert_eq!(bad(|s| s.min_wallet_count = 0), SettingsError::MinWalletCount(0));
        assert_eq!(bad(|s| s.time_window_minutes = 0), SettingsError::TimeWindow(0));
        assert_eq!(
            bad(|s| s.time_window_minutes = MAX_TIME_WINDOW_MINUTES + 1),
            SettingsError::TimeWindow(MAX_TIME_WINDOW_MINUTES + 1)
        );
        assert_eq!(bad(|s| s.min_volume = Decimal::NEGATIVE_ONE), SettingsError::MinVolume(Decimal::NEGATIVE_ONE));
        assert_eq!(bad(|s| s.take_profit_targets.clear()), SettingsError::NoTakeProfitTargets);
        assert_eq!(
            bad(|s| s.take_profit_targets = vec![Decimal::ONE, Decimal::ZERO]),
            SettingsError::TakeProfitTarget(Decimal::ZERO)
        );
        assert_eq!(bad(|s| s.default_stop_loss_pct = Decimal::ONE), SettingsError::StopLoss(Decimal::ONE));
    }

    #[test]
    fn test_non_positive_settings_not_runnable() {
        let s = Settings {
            min_wallet_count: 0,
            ..Settings::default()
        };
        assert!(!s.is_runnable());

        let s = Settings {
            time_window_minutes: -1,
            ..Settings::default()
        };
        assert!(!s.is_runnable());
    }
}
