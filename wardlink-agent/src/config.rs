//! Agent configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use wardlink_store::{keys, Store, StoreResult};

/// Default management server base URL, including the API prefix.
pub const DEFAULT_SERVER_URL: &str = "https://portal.wardlink.app/api/wardlink";

/// Configuration for the agent core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Management server base URL (endpoint paths are appended to this).
    pub server_url: String,
    /// Interval between command poll cycles, measured start to start.
    pub poll_interval: Duration,
    /// HTTP connect timeout.
    pub connect_timeout: Duration,
    /// HTTP read timeout.
    pub read_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll_interval: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(15),
            read_timeout: Duration::from_secs(15),
        }
    }
}

impl AgentConfig {
    /// Builds the configuration, honoring a persisted `server_url`
    /// override if one is stored.
    pub fn load(store: &Store) -> StoreResult<Self> {
        let mut config = Self::default();
        if let Some(url) = store.get_string(keys::SERVER_URL)? {
            if !url.is_empty() {
                config.server_url = url;
            }
        }
        Ok(config)
    }
}
