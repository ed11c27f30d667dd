use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::filters::{SortDir, SortKey};

/// One row of the latest listings, as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Listing {
    pub id: u64,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub cmc_rank: Option<u32>,
    pub quote: Quote,
}

impl Listing {
    pub fn usd(&self) -> &UsdQuote {
        &self.quote.usd
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Quote {
    #[serde(rename = "USD")]
    pub usd: UsdQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct UsdQuote {
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub market_cap: f64,
    #[serde(default)]
    pub percent_change_24h: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogoInfo {
    pub logo: String,
}

pub type LogoMap = HashMap<u64, LogoInfo>;

#[derive(Debug, Deserialize)]
pub(crate) struct ListingsResponse {
    pub(crate) data: Vec<Listing>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InfoResponse {
    pub(crate) data: HashMap<String, LogoInfo>,
}

/// Error envelope the API returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusEnvelope {
    pub(crate) status: ApiStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiStatus {
    #[serde(default)]
    pub(crate) error_message: Option<String>,
}

/// Parameters for one listings request. `start` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap_max: Option<f64>,
    pub sort: SortKey,
    pub sort_dir: SortDir,
    pub start: u32,
    pub limit: u32,
}

impl Default for ListingsQuery {
    fn default() -> Self {
        Self {
            price_min: None,
            price_max: None,
            market_cap_min: None,
            market_cap_max: None,
            sort: SortKey::MarketCap,
            sort_dir: SortDir::Desc,
            start: 1,
            limit: 100,
        }
    }
}

impl ListingsQuery {
    /// Stable cache key: every parameter in a fixed order, absent ones empty.
    pub fn cache_key(&self) -> String {
        fn opt(value: Option<f64>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }
        format!(
            "price_min={}&price_max={}&market_cap_min={}&market_cap_max={}&sort={}&sort_dir={}&start={}&limit={}",
            opt(self.price_min),
            opt(self.price_max),
            opt(self.market_cap_min),
            opt(self.market_cap_max),
            self.sort,
            self.sort_dir,
            self.start,
            self.limit,
        )
    }
}
