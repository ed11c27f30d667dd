pub mod client;
pub mod coinmarketcap;
pub mod error;
pub mod traits;
pub mod types;

pub use client::QueryClient;
pub use coinmarketcap::CoinMarketCapSource;
pub use error::FetchError;
pub use traits::MarketDataSource;
pub use types::{Listing, ListingsQuery, LogoInfo, LogoMap};
