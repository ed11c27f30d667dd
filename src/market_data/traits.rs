use async_trait::async_trait;

use super::error::FetchError;
use super::types::{Listing, ListingsQuery, LogoMap};

/// Remote source of listings and logo metadata.
///
/// The HTTP implementation lives in `coinmarketcap`; tests plug in an
/// in-memory source.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_listings(&self, query: &ListingsQuery) -> Result<Vec<Listing>, FetchError>;

    /// Only called with a non-empty id set. Ids missing from the result are
    /// not an error.
    async fn fetch_logos(&self, ids: &[u64]) -> Result<LogoMap, FetchError>;
}
