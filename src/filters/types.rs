use std::fmt;

use serde::Serialize;

/// Rows requested per window while in infinite-scroll mode.
pub const INFINITE_SCROLL_LIMIT: u32 = 30;

pub const DEFAULT_MIN_MARKET_CAP: f64 = 0.0;
pub const DEFAULT_MAX_PRICE: f64 = 117_839.0;
pub const DEFAULT_SORT_KEY: SortKey = SortKey::MarketCap;
pub const DEFAULT_SORT_DIR: SortDir = SortDir::Desc;
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: PageSize = PageSize::Ten;

/// Columns the listing can be ordered by. Serialises to the API's `sort` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SortKey {
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "symbol")]
    Symbol,
    #[serde(rename = "price")]
    Price,
    #[serde(rename = "market_cap")]
    MarketCap,
    #[serde(rename = "percent_change_24h")]
    PercentChange24h,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Name,
        SortKey::Symbol,
        SortKey::Price,
        SortKey::MarketCap,
        SortKey::PercentChange24h,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Symbol => "symbol",
            SortKey::Price => "price",
            SortKey::MarketCap => "market_cap",
            SortKey::PercentChange24h => "percent_change_24h",
        }
    }

    /// Exact match only; anything else is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == raw)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortDir::Asc),
            "desc" => Some(SortDir::Desc),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows per page. `All` switches the listing into infinite-scroll mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageSize {
    Ten,
    Twenty,
    Fifty,
    Hundred,
    All,
}

impl PageSize {
    pub const OPTIONS: [PageSize; 5] = [
        PageSize::Ten,
        PageSize::Twenty,
        PageSize::Fifty,
        PageSize::Hundred,
        PageSize::All,
    ];

    /// Fixed row count, or `None` in infinite-scroll mode.
    pub fn rows(self) -> Option<u32> {
        match self {
            PageSize::Ten => Some(10),
            PageSize::Twenty => Some(20),
            PageSize::Fifty => Some(50),
            PageSize::Hundred => Some(100),
            PageSize::All => None,
        }
    }

    pub fn is_all(self) -> bool {
        matches!(self, PageSize::All)
    }

    pub fn as_query_value(self) -> String {
        match self.rows() {
            Some(rows) => rows.to_string(),
            None => "All".to_string(),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::OPTIONS
            .into_iter()
            .find(|size| size.as_query_value() == raw)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_query_value())
    }
}

/// The complete set of user-controlled listing parameters.
///
/// `max_price` of `None` means the price has no upper bound.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub min_market_cap: f64,
    pub max_price: Option<f64>,
    pub sort_key: SortKey,
    pub sort_dir: SortDir,
    pub page: u32,
    pub page_size: PageSize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            min_market_cap: DEFAULT_MIN_MARKET_CAP,
            max_price: Some(DEFAULT_MAX_PRICE),
            sort_key: DEFAULT_SORT_KEY,
            sort_dir: DEFAULT_SORT_DIR,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
