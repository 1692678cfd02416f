use async_trait::async_trait;
use serde_json::json;

use crate::models::{Direction, Signal};

/// Outbound alert port. Called once per new signal after it is persisted;
/// implementations log their own failures and never report them back.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, signal: &Signal);
}

/// Telegram notification service. Failures are logged but never block the main flow.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    http: reqwest::Client,
    bot_token: String,
    channel_ids: Vec<String>,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, channel_ids: Vec<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token,
            channel_ids,
        }
    }

    /// Send a Telegram message to one chat. Failures are logged as warnings.
    pub async fn send(&self, chat_id: &str, message: &str) {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let body = json!({
            "chat_id": chat_id,
            "text": message,
            "parse_mode": "Markdown",
        });

        match self.http.post(&url).json(&body).send().await {
            Ok(resp) => {
                if resp.status().is_success() {
                    tracing::info!(chat_id = %chat_id, "Telegram message sent");
                } else {
                    tracing::warn!(
                        status = %resp.status(),
                        chat_id = %chat_id,
                        "Telegram sendMessage returned non-2xx"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, chat_id = %chat_id, "Failed to send Telegram notification");
            }
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn notify(&self, signal: &Signal) {
        let message = format_signal_alert(signal);
        for chat_id in &self.channel_ids {
            self.send(chat_id, &message).await;
        }
    }
}

/// Format a new-signal alert.
pub fn format_signal_alert(signal: &Signal) -> String {
    let direction = match signal.direction {
        Direction::Long => "⬆️ LONG",
        Direction::Short => "⬇️ SHORT",
    };

    let targets = signal
        .take_profit_levels
        .iter()
        .enumerate()
        .map(|(i, tp)| format!("TP {}: {}", i + 1, tp))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "*New Signal Detected!*\n\
         *{}-USDC*\n\
         *Direction:* {}\n\
         *Entry Price:* {}\n\
         *Total Margin:* ${}\n\
         *Avg. Leverage:* {}x\n\
         *Consensus:* {} wallets\n\
         *Stop Loss:* {}\n\
         *Take Profit Targets:*\n{}",
        signal.instrument,
        direction,
        signal.entry_price.round_dp(4),
        signal.margin.round_dp(2),
        signal.leverage.round_dp(2),
        signal.contributing_wallets(),
        signal.stop_loss_level.round_dp(4),
        targets,
    )
}
