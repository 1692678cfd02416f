pub mod analytics;
pub mod attribution;
pub mod cluster;
pub mod cooldown;
pub mod factory;
pub mod lifecycle;

pub use analytics::{dashboard_summary, wallet_leaderboard, DashboardSummary, LeaderboardRow};
pub use attribution::{apply_to_wallets, attribute, Attribution};
pub use cluster::{detect_clusters, Cluster};
pub use cooldown::CooldownLedger;
pub use factory::build_signal;
pub use lifecycle::{apply_price, Tick};
