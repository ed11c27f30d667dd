use std::collections::HashMap;

use reqwest::Url;
use tokio::sync::watch;
use tracing::{debug, trace};

use super::coerce::{parse_non_negative_or_default, parse_number_or_default, parse_page_or_default};
use super::types::{FilterState, PageSize, SortDir, SortKey};
use crate::metrics;

pub const PARAM_MIN_MARKET_CAP: &str = "minMarketCap";
pub const PARAM_MAX_PRICE: &str = "maxPrice";
pub const PARAM_SORT_BY: &str = "sortBy";
pub const PARAM_ORDER: &str = "order";
pub const PARAM_PAGE: &str = "page";
pub const PARAM_PAGE_SIZE: &str = "pageSize";

impl FilterState {
    /// Read every field from a location's query string. Absent or invalid
    /// values fall back to the matching field of `defaults`.
    pub fn from_url(location: &Url, defaults: &FilterState) -> Self {
        // First occurrence wins, like URLSearchParams::get.
        let mut params: HashMap<String, String> = HashMap::new();
        for (key, value) in location.query_pairs() {
            params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        let get = |name: &'static str| params.get(name).map(String::as_str);

        let max_price = match get(PARAM_MAX_PRICE) {
            // An empty value is how the unbounded ceiling is written out.
            Some(raw) if raw.is_empty() => None,
            Some(raw) => match parse_number_or_default(Some(raw), f64::NAN) {
                value if value >= 0.0 => Some(value),
                _ => defaults.max_price,
            },
            None => defaults.max_price,
        };

        let state = Self {
            min_market_cap: parse_non_negative_or_default(
                get(PARAM_MIN_MARKET_CAP),
                defaults.min_market_cap,
            ),
            max_price,
            sort_key: get(PARAM_SORT_BY)
                .and_then(SortKey::parse)
                .unwrap_or(defaults.sort_key),
            sort_dir: get(PARAM_ORDER)
                .and_then(SortDir::parse)
                .unwrap_or(defaults.sort_dir),
            page: parse_page_or_default(get(PARAM_PAGE), defaults.page),
            page_size: get(PARAM_PAGE_SIZE)
                .and_then(PageSize::parse)
                .unwrap_or(defaults.page_size),
        };

        if &state != defaults {
            debug!(?state, "filters restored from location");
        }
        state
    }

    /// Query pairs in a fixed order. Equal states always serialise identically.
    pub fn to_query_pairs(&self) -> [(&'static str, String); 6] {
        [
            (PARAM_MIN_MARKET_CAP, self.min_market_cap.to_string()),
            (
                PARAM_MAX_PRICE,
                self.max_price.map(|p| p.to_string()).unwrap_or_default(),
            ),
            (PARAM_SORT_BY, self.sort_key.as_str().to_string()),
            (PARAM_ORDER, self.sort_dir.as_str().to_string()),
            (PARAM_PAGE, self.page.to_string()),
            (PARAM_PAGE_SIZE, self.page_size.as_query_value()),
        ]
    }
}

/// Owns the canonical [`FilterState`] and keeps a location's query string
/// mirroring it.
///
/// Every committed change rewrites the whole query string (all six
/// parameters, never a subset) and publishes the new location to
/// subscribers. Setters that leave the state unchanged do not publish.
#[derive(Debug)]
pub struct FilterStore {
    state: FilterState,
    defaults: FilterState,
    location: Url,
    location_tx: watch::Sender<Url>,
    rewrites: u64,
}

impl FilterStore {
    pub fn new(mut location: Url, defaults: FilterState) -> Self {
        let state = FilterState::from_url(&location, &defaults);
        write_query(&mut location, &state);
        let (location_tx, _) = watch::channel(location.clone());

        Self {
            state,
            defaults,
            location,
            location_tx,
            rewrites: 1,
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Number of times the query string has been written, including the
    /// initial write on construction.
    pub fn rewrites(&self) -> u64 {
        self.rewrites
    }

    pub fn subscribe(&self) -> watch::Receiver<Url> {
        self.location_tx.subscribe()
    }

    /// Negative and non-finite values are clamped to zero.
    pub fn set_min_market_cap(&mut self, value: f64) {
        let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
        self.update(|state| state.min_market_cap = value);
    }

    /// `None` or an infinite value removes the upper bound.
    pub fn set_max_price(&mut self, value: Option<f64>) {
        let value = value.filter(|v| v.is_finite()).map(|v| v.max(0.0));
        self.update(|state| state.max_price = value);
    }

    pub fn set_sort_key(&mut self, key: SortKey) {
        self.update(|state| state.sort_key = key);
    }

    pub fn set_sort_dir(&mut self, dir: SortDir) {
        self.update(|state| state.sort_dir = dir);
    }

    /// Set column and direction together with a single rewrite.
    pub fn set_sort(&mut self, key: SortKey, dir: SortDir) {
        self.update(|state| {
            state.sort_key = key;
            state.sort_dir = dir;
        });
    }

    /// Page numbers start at 1; zero is clamped.
    pub fn set_page(&mut self, page: u32) {
        self.update(|state| state.page = page.max(1));
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.update(|state| state.page_size = page_size);
    }

    /// Restore every field to the defaults with a single query rewrite.
    pub fn reset(&mut self) {
        let defaults = self.defaults.clone();
        self.update(|state| *state = defaults);
    }

    fn update(&mut self, mutate: impl FnOnce(&mut FilterState)) {
        let mut next = self.state.clone();
        mutate(&mut next);
        if next == self.state {
            return;
        }
        self.state = next;
        self.commit();
    }

    fn commit(&mut self) {
        write_query(&mut self.location, &self.state);
        self.rewrites += 1;
        metrics::record_url_rewrite();
        trace!(location = %self.location, "location rewritten");
        self.location_tx.send_replace(self.location.clone());
    }
}

fn write_query(location: &mut Url, state: &FilterState) {
    location
        .query_pairs_mut()
        .clear()
        .extend_pairs(state.to_query_pairs());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(query: &str) -> Url {
        Url::parse(&format!("http://localhost/{query}")).unwrap()
    }

    fn param(url: &Url, name: &str) -> Option<String> {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    #[test]
    fn defaults_apply_without_query() {
        let store = FilterStore::new(location(""), FilterState::default());
        assert_eq!(store.state(), &FilterState::default());
        assert_eq!(
            store.location().query(),
            Some("minMarketCap=0&maxPrice=117839&sortBy=market_cap&order=desc&page=1&pageSize=10")
        );
    }

    #[test]
    fn query_values_override_defaults() {
        let store = FilterStore::new(
            location("?minMarketCap=1000000&maxPrice=500&sortBy=price&order=asc&page=3&pageSize=All"),
            FilterState::default(),
        );
        let state = store.state();
        assert_eq!(state.min_market_cap, 1_000_000.0);
        assert_eq!(state.max_price, Some(500.0));
        assert_eq!(state.sort_key, SortKey::Price);
        assert_eq!(state.sort_dir, SortDir::Asc);
        assert_eq!(state.page, 3);
        assert_eq!(state.page_size, PageSize::All);
    }

    #[test]
    fn invalid_query_values_fall_back_individually() {
        let store = FilterStore::new(
            location("?minMarketCap=lots&maxPrice=-1&sortBy=volume&order=up&page=0&pageSize=25"),
            FilterState::default(),
        );
        assert_eq!(store.state(), &FilterState::default());
    }

    #[test]
    fn empty_max_price_round_trips_as_unbounded() {
        let mut store = FilterStore::new(location(""), FilterState::default());
        store.set_max_price(None);
        assert_eq!(param(store.location(), PARAM_MAX_PRICE).as_deref(), Some(""));

        let reloaded = FilterStore::new(store.location().clone(), FilterState::default());
        assert_eq!(reloaded.state().max_price, None);
        assert_eq!(reloaded.location(), store.location());
    }

    #[test]
    fn every_change_rewrites_the_full_query() {
        let mut store = FilterStore::new(location(""), FilterState::default());
        store.set_min_market_cap(1_000_000.0);
        store.set_sort_key(SortKey::Price);
        store.set_sort_dir(SortDir::Asc);
        store.set_page_size(PageSize::Twenty);

        let url = store.location();
        assert_eq!(param(url, PARAM_MIN_MARKET_CAP).as_deref(), Some("1000000"));
        assert_eq!(param(url, PARAM_MAX_PRICE).as_deref(), Some("117839"));
        assert_eq!(param(url, PARAM_SORT_BY).as_deref(), Some("price"));
        assert_eq!(param(url, PARAM_ORDER).as_deref(), Some("asc"));
        assert_eq!(param(url, PARAM_PAGE).as_deref(), Some("1"));
        assert_eq!(param(url, PARAM_PAGE_SIZE).as_deref(), Some("20"));
        assert_eq!(url.query_pairs().count(), 6);
        assert_eq!(store.rewrites(), 5);
    }

    #[test]
    fn unchanged_values_do_not_rewrite() {
        let mut store = FilterStore::new(location(""), FilterState::default());
        store.set_sort_key(SortKey::MarketCap);
        store.set_page(1);
        assert_eq!(store.rewrites(), 1);
    }

    #[test]
    fn reset_publishes_all_defaults_at_once() {
        let mut store = FilterStore::new(location(""), FilterState::default());
        store.set_min_market_cap(123_456.0);
        store.set_sort_key(SortKey::Name);
        store.set_page(4);

        let mut rx = store.subscribe();
        rx.borrow_and_update();
        let before = store.rewrites();

        store.reset();

        assert_eq!(store.rewrites(), before + 1);
        assert!(rx.has_changed().unwrap());
        let published = rx.borrow_and_update().clone();
        let restored = FilterState::from_url(&published, &FilterState {
            min_market_cap: 1.0,
            ..FilterState::default()
        });
        assert_eq!(restored, FilterState::default());
        assert_eq!(store.state(), &FilterState::default());
    }

    #[test]
    fn same_state_serialises_identically_regardless_of_path() {
        let mut a = FilterStore::new(location(""), FilterState::default());
        a.set_sort_dir(SortDir::Asc);
        a.set_page(2);

        let mut b = FilterStore::new(location("?page=9&order=asc&junk=1"), FilterState::default());
        b.set_page(2);

        assert_eq!(a.location().query(), b.location().query());
    }

    #[test]
    fn setters_clamp_out_of_range_values() {
        let mut store = FilterStore::new(location(""), FilterState::default());
        store.set_min_market_cap(-5.0);
        store.set_page(0);
        store.set_max_price(Some(f64::INFINITY));
        assert_eq!(store.state().min_market_cap, 0.0);
        assert_eq!(store.state().page, 1);
        assert_eq!(store.state().max_price, None);
    }
}
