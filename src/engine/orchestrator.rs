use tracing::debug;

use crate::filters::{FilterState, INFINITE_SCROLL_LIMIT, PageSize};
use crate::market_data::types::ListingsQuery;

/// 1-based offset and row count of one listings window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: u32,
    pub limit: u32,
}

pub fn fetch_window(page: u32, page_size: PageSize) -> FetchWindow {
    let limit = page_size.rows().unwrap_or(INFINITE_SCROLL_LIMIT);
    let start = page
        .max(1)
        .saturating_sub(1)
        .saturating_mul(limit)
        .saturating_add(1);
    FetchWindow { start, limit }
}

/// Build the remote query. The market cap floor and price ceiling come from
/// their debounced values; everything else is read live from `state`.
pub fn build_query(
    state: &FilterState,
    min_market_cap: f64,
    max_price: Option<f64>,
) -> ListingsQuery {
    let window = fetch_window(state.page, state.page_size);
    ListingsQuery {
        price_min: None,
        price_max: max_price,
        market_cap_min: Some(min_market_cap),
        market_cap_max: None,
        sort: state.sort_key,
        sort_dir: state.sort_dir,
        start: window.start,
        limit: window.limit,
    }
}

/// A request the session should issue.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub generation: u64,
    pub page_size: PageSize,
    pub query: ListingsQuery,
}

/// Tracks which query was issued last and whether it is still running.
///
/// Every issued request carries a generation number; only the newest
/// generation may update the table; older responses are stale.
#[derive(Debug, Default)]
pub struct QueryOrchestrator {
    last_query: Option<ListingsQuery>,
    generation: u64,
    in_flight: bool,
}

impl QueryOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a ticket when `query` differs from the last one issued.
    pub fn plan(&mut self, query: ListingsQuery, page_size: PageSize) -> Option<FetchTicket> {
        if self.last_query.as_ref() == Some(&query) {
            return None;
        }
        self.generation += 1;
        self.in_flight = true;
        self.last_query = Some(query.clone());
        debug!(
            generation = self.generation,
            start = query.start,
            limit = query.limit,
            "listings query planned"
        );
        Some(FetchTicket {
            generation: self.generation,
            page_size,
            query,
        })
    }

    /// Mark `generation` complete. Returns `false` for stale generations,
    /// whose results must be discarded.
    pub fn complete(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.in_flight = false;
        true
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
