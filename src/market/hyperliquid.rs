use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;

use super::types::{ApiClearinghouseState, ApiFill, InfoRequest};
use super::{GatewayError, MarketGateway};
use crate::models::{Fill, WalletState};

/// Client for the Hyperliquid `POST /info` endpoint.
#[derive(Debug, Clone)]
pub struct InfoClient {
    http: Client,
    base_url: String,
}

impl InfoClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build with a dedicated HTTP client carrying a per-request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(http, base_url))
    }

    async fn post_info<T: serde::de::DeserializeOwned>(
        &self,
        request: &InfoRequest,
    ) -> Result<T, GatewayError> {
        let url = format!("{}/info", self.base_url);
        let resp = self.http.post(&url).json(request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }

        let body: T = resp.json().await?;
        Ok(body)
    }

    /// Mid prices for every listed perp, keyed by coin.
    pub async fn all_mids(&self) -> Result<HashMap<String, String>, GatewayError> {
        self.post_info(&InfoRequest::AllMids).await
    }
}

#[async_trait]
impl MarketGateway for InfoClient {
    async fn fills(&self, address: &str) -> Result<Vec<Fill>, GatewayError> {
        let raw: Vec<ApiFill> = self
            .post_info(&InfoRequest::UserFills {
                user: address.to_string(),
            })
            .await?;

        let total = raw.len();
        let fills: Vec<Fill> = raw
            .into_iter()
            .filter_map(|f| f.into_fill(address))
            .collect();

        if fills.len() < total {
            tracing::debug!(
                address = %address,
                dropped = total - fills.len(),
                "Dropped malformed fills"
            );
        }

        Ok(fills)
    }

    async fn mark_price(&self, instrument: &str) -> Result<Option<Decimal>, GatewayError> {
        let mids = self.all_mids().await?;

        let Some(raw) = mids.get(instrument) else {
            return Ok(None);
        };

        let price: Decimal = raw
            .parse()
            .map_err(|_| GatewayError::Unexpected(format!("bad mid for {instrument}: {raw}")))?;

        Ok((price > Decimal::ZERO).then_some(price))
    }

    async fn wallet_state(&self, address: &str) -> Result<WalletState, GatewayError> {
        let raw: ApiClearinghouseState = self
            .post_info(&InfoRequest::ClearinghouseState {
                user: address.to_string(),
            })
            .await?;

        Ok(raw.into_wallet_state(address))
    }
}
