pub mod accumulator;
pub mod query_cache;

pub use accumulator::Accumulator;
pub use query_cache::{Endpoint, QueryCache, QueryKey};
