use std::collections::HashSet;

use tracing::debug;

use crate::filters::{FilterState, PageSize, SortDir, SortKey};
use crate::market_data::types::Listing;

/// The filter fields whose change invalidates accumulated rows.
/// Page number is deliberately absent.
#[derive(Debug, Clone, PartialEq)]
struct ResetKey {
    min_market_cap: f64,
    max_price: Option<f64>,
    sort_key: SortKey,
    sort_dir: SortDir,
}

impl From<&FilterState> for ResetKey {
    fn from(state: &FilterState) -> Self {
        Self {
            min_market_cap: state.min_market_cap,
            max_price: state.max_price,
            sort_key: state.sort_key,
            sort_dir: state.sort_dir,
        }
    }
}

/// Decides what the table shows for each fetch result.
///
/// In paged mode the displayed rows are exactly the result of the query
/// currently issued, and nothing until it arrives. In `All` mode results are
/// appended in arrival order, skipping ids already present (first seen wins).
/// Accumulated rows are cleared whenever a sort or filter field changes, and
/// on any transition into or out of `All` mode.
#[derive(Debug, Clone)]
pub struct Accumulator {
    latest: Vec<Listing>,
    accumulated: Vec<Listing>,
    seen: HashSet<u64>,
    last_key: ResetKey,
    last_page_size: PageSize,
}

impl Accumulator {
    pub fn new(state: &FilterState) -> Self {
        Self {
            latest: Vec::new(),
            accumulated: Vec::new(),
            seen: HashSet::new(),
            last_key: ResetKey::from(state),
            last_page_size: state.page_size,
        }
    }

    /// Feed the current filters. Returns `true` if accumulated rows were cleared.
    pub fn observe(&mut self, state: &FilterState) -> bool {
        let key = ResetKey::from(state);
        let filters_changed = key != self.last_key;
        let mode_changed = state.page_size.is_all() != self.last_page_size.is_all();
        self.last_key = key;
        self.last_page_size = state.page_size;

        if filters_changed || mode_changed || !state.page_size.is_all() {
            let had_rows = !self.accumulated.is_empty();
            self.clear_accumulated();
            if had_rows {
                debug!(filters_changed, mode_changed, "accumulated rows cleared");
            }
            return had_rows;
        }
        false
    }

    /// A new query was issued; the paged rows belong to the previous one.
    pub fn begin_query(&mut self) {
        if !self.latest.is_empty() {
            debug!(rows = self.latest.len(), "paged rows cleared for new query");
        }
        self.latest.clear();
    }

    /// Merge one fetch result produced under `page_size`.
    pub fn apply(&mut self, page_size: PageSize, batch: Vec<Listing>) {
        if !page_size.is_all() {
            self.latest = batch;
            return;
        }

        let before = self.accumulated.len();
        for row in batch {
            if self.seen.insert(row.id) {
                self.accumulated.push(row);
            }
        }
        debug!(
            appended = self.accumulated.len() - before,
            total = self.accumulated.len(),
            "rows accumulated"
        );
    }

    /// Rows to display for the given mode.
    pub fn rows(&self, page_size: PageSize) -> &[Listing] {
        if page_size.is_all() {
            &self.accumulated
        } else {
            &self.latest
        }
    }

    fn clear_accumulated(&mut self) {
        self.accumulated.clear();
        self.seen.clear();
    }
}
