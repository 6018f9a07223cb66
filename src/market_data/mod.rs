pub mod client;

// Re-export the Bar struct for convenient access (e.g. `use crate::market_data::Bar`).
pub use client::{Bar, MarketDataClient};
