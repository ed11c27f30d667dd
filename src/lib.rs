pub mod commands;
pub mod config;
pub mod engine;
pub mod export;
pub mod filters;
pub mod market_data;
pub mod metrics;
pub mod render;
pub mod state;
pub mod timing;
