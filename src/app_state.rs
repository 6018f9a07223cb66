// =============================================================================
// Central Application State
// =============================================================================
//
// Shared state for the API handlers, held behind `Arc<AppState>`. The
// pipeline itself is stateless (every request recomputes from a fresh
// fetch), so the state is small: the runtime configuration behind a
// parking_lot RwLock and the provider client, which owns the pooled HTTP
// connections.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::market_data::MarketDataClient;
use crate::runtime_config::RuntimeConfig;

/// Application state shared across request handlers via `Arc<AppState>`.
pub struct AppState {
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,
    pub market_client: Arc<MarketDataClient>,
    /// Instant the process started, for uptime reporting.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct state from the loaded configuration and the provider key.
    pub fn new(config: RuntimeConfig, api_key: String) -> Self {
        let market_client = Arc::new(MarketDataClient::new(
            api_key,
            config.fetch_timeout_secs,
            config.fetch_retries,
        ));

        Self {
            runtime_config: Arc::new(RwLock::new(config)),
            market_client,
            start_time: std::time::Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
