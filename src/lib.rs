pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod grading;
pub mod llm;
pub mod logging;
pub mod normalize;
pub mod orchestrator;
pub mod prompts;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use config::Config;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Pooled client for upstream provider calls.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> error::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }
}
