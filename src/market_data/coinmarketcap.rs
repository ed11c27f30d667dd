use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::FetchError;
use super::traits::MarketDataSource;
use super::types::{InfoResponse, Listing, ListingsQuery, ListingsResponse, LogoMap, StatusEnvelope};
use crate::metrics;

pub const DEFAULT_BASE_URL: &str = "https://pro-api.coinmarketcap.com";
const LISTINGS_PATH: &str = "/v1/cryptocurrency/listings/latest";
const INFO_PATH: &str = "/v1/cryptocurrency/info";
const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

/// CoinMarketCap Pro API over HTTPS.
#[derive(Clone)]
pub struct CoinMarketCapSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinMarketCapSource {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build market data client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("Accept", "application/json");

        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, FetchError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StatusEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.status.error_message)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| FetchError::Decode(err.to_string()))
    }
}

#[async_trait]
impl MarketDataSource for CoinMarketCapSource {
    async fn fetch_listings(&self, query: &ListingsQuery) -> Result<Vec<Listing>, FetchError> {
        let started = Instant::now();
        let request = self
            .request(LISTINGS_PATH)
            .query(query)
            .query(&[("convert", "USD")]);
        let result = Self::send::<ListingsResponse>(request)
            .await
            .map(|response| response.data);

        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::record_listings_fetch(outcome);
        metrics::record_listings_latency(started.elapsed().as_secs_f64() * 1_000.0);
        debug!(
            start = query.start,
            limit = query.limit,
            outcome,
            "listings request finished"
        );
        result
    }

    async fn fetch_logos(&self, ids: &[u64]) -> Result<LogoMap, FetchError> {
        let joined = ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let request = self
            .request(INFO_PATH)
            .query(&[("id", joined.as_str()), ("aux", "logo")]);
        let response = Self::send::<InfoResponse>(request).await?;

        Ok(response
            .data
            .into_iter()
            .filter_map(|(id, info)| id.parse::<u64>().ok().map(|id| (id, info)))
            .collect())
    }
}
