//! Rule engine client configuration.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL of the rule engine API.
    pub url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Tasks fetched per page when listing.
    pub page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9092".to_string(),
            timeout_secs: 30,
            page_size: 500,
        }
    }
}
