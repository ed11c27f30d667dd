use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::engine::session::{DEFAULT_FILTER_DEBOUNCE, DEFAULT_SCROLL_THROTTLE};
use crate::market_data::client::{DEFAULT_LISTINGS_STALE, DEFAULT_LOGOS_STALE};
use crate::market_data::coinmarketcap::DEFAULT_BASE_URL;

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub request_timeout: Duration,
    pub filter_debounce: Duration,
    pub scroll_throttle: Duration,
    pub listings_stale: Duration,
    pub logos_stale: Duration,
    pub metrics_port: Option<u16>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // dotenvy loads .env, but doesn't override already-set env vars
        dotenvy::dotenv().ok();
        Ok(Self::from_lookup(|name| env::var(name).ok()))
    }

    /// Build from an arbitrary variable lookup. Missing or unparsable values
    /// fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let parse_ms = |name: &str, default: Duration| {
            read(name)
                .and_then(|value| parse_logged::<u64>(name, &value))
                .map(Duration::from_millis)
                .unwrap_or(default)
        };
        let parse_secs = |name: &str, default: Duration| {
            read(name)
                .and_then(|value| parse_logged::<u64>(name, &value))
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        let api_key = read("COINMARKETCAP_API_KEY");
        if api_key.is_none() {
            warn!("COINMARKETCAP_API_KEY not set; requests will be rejected by the API");
        }

        Self {
            api_key,
            base_url: read("COINMARKETCAP_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout: parse_ms(
                "REQUEST_TIMEOUT_MS",
                Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            ),
            filter_debounce: parse_ms("FILTER_DEBOUNCE_MS", DEFAULT_FILTER_DEBOUNCE),
            scroll_throttle: parse_ms("SCROLL_THROTTLE_MS", DEFAULT_SCROLL_THROTTLE),
            listings_stale: parse_secs("LISTINGS_STALE_SECS", DEFAULT_LISTINGS_STALE),
            logos_stale: parse_secs("LOGOS_STALE_SECS", DEFAULT_LOGOS_STALE),
            metrics_port: read("METRICS_PORT").and_then(|value| parse_logged::<u16>("METRICS_PORT", &value)),
        }
    }
}

fn parse_logged<T: FromStr>(name: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse::<T>().ok();
    if parsed.is_none() {
        warn!(name, value, "ignoring invalid setting");
    }
    parsed
}
