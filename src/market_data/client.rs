use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::error::FetchError;
use super::traits::MarketDataSource;
use super::types::{Listing, ListingsQuery, LogoMap};
use crate::metrics;
use crate::state::query_cache::{Endpoint, QueryCache, QueryKey};

pub const DEFAULT_LISTINGS_STALE: Duration = Duration::from_secs(60);
pub const DEFAULT_LOGOS_STALE: Duration = Duration::from_secs(60 * 60);

/// Caching front for a [`MarketDataSource`].
///
/// Requests are keyed by endpoint plus normalised parameters. A fresh
/// cached answer is returned without touching the source; failures are
/// never cached.
#[derive(Clone)]
pub struct QueryClient {
    source: Arc<dyn MarketDataSource>,
    listings: QueryCache<Vec<Listing>>,
    logos: QueryCache<LogoMap>,
}

impl QueryClient {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self::with_staleness(source, DEFAULT_LISTINGS_STALE, DEFAULT_LOGOS_STALE)
    }

    pub fn with_staleness(
        source: Arc<dyn MarketDataSource>,
        listings_stale: Duration,
        logos_stale: Duration,
    ) -> Self {
        Self {
            source,
            listings: QueryCache::new(listings_stale),
            logos: QueryCache::new(logos_stale),
        }
    }

    pub async fn listings(&self, query: &ListingsQuery) -> Result<Vec<Listing>, FetchError> {
        let key = QueryKey(Endpoint::Listings, query.cache_key());
        if let Some(rows) = self.listings.get_fresh(&key) {
            metrics::record_cache(Endpoint::Listings.as_str(), true);
            return Ok(rows);
        }
        metrics::record_cache(Endpoint::Listings.as_str(), false);

        debug!(start = query.start, limit = query.limit, sort = %query.sort, "fetching listings");
        let rows = self.source.fetch_listings(query).await?;
        self.listings.insert(key, rows.clone());
        Ok(rows)
    }

    /// Best-effort logo lookup. An empty id set never reaches the source,
    /// and a failed lookup yields an empty map.
    pub async fn logos(&self, ids: &[u64]) -> LogoMap {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return LogoMap::new();
        }

        let joined = ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let key = QueryKey(Endpoint::Logos, joined);
        if let Some(logos) = self.logos.get_fresh(&key) {
            metrics::record_cache(Endpoint::Logos.as_str(), true);
            return logos;
        }
        metrics::record_cache(Endpoint::Logos.as_str(), false);

        match self.source.fetch_logos(&ids).await {
            Ok(logos) => {
                self.logos.insert(key, logos.clone());
                logos
            }
            Err(err) => {
                warn!(error = %err, count = ids.len(), "logo lookup failed");
                LogoMap::new()
            }
        }
    }

    pub fn evict_stale(&self) {
        self.listings.evict_stale();
        self.logos.evict_stale();
    }
}
