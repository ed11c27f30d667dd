pub mod coerce;
pub mod store;
pub mod types;

pub use coerce::parse_number_or_default;
pub use store::FilterStore;
pub use types::{FilterState, INFINITE_SCROLL_LIMIT, PageSize, SortDir, SortKey};
