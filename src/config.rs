//! Client configuration, loaded from `MODEL_CLIENT_`-prefixed environment
//! variables.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct ClientConfig {
    /// API token sent as the `Authorization` header. Optional so that the
    /// client can talk to unauthenticated deployments.
    pub api_token: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// How long to sleep between polls while waiting on a prediction.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-request timeout enforced by the HTTP transport.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    String::from("http://127.0.0.1:8000")
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        envy::prefixed("MODEL_CLIENT_")
            .from_env()
            .context("failed to read client config from environment")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_token: None,
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::ClientConfig;

    // Single test covering both the default and the populated path, so that
    // env mutation never races a parallel test.
    #[test]
    pub fn config_from_env() {
        for key in [
            "MODEL_CLIENT_API_TOKEN",
            "MODEL_CLIENT_BASE_URL",
            "MODEL_CLIENT_POLL_INTERVAL_MS",
            "MODEL_CLIENT_TIMEOUT_SECS",
        ] {
            std::env::remove_var(key);
        }

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.api_token, None);
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.timeout_secs, 30);

        std::env::set_var("MODEL_CLIENT_API_TOKEN", "s3cret");
        std::env::set_var("MODEL_CLIENT_BASE_URL", "https://models.example.com");
        std::env::set_var("MODEL_CLIENT_POLL_INTERVAL_MS", "50");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.api_token.as_deref(), Some("s3cret"));
        assert_eq!(config.base_url, "https://models.example.com");
        assert_eq!(config.poll_interval_ms, 50);
        assert_eq!(config.timeout_secs, 30);

        std::env::remove_var("MODEL_CLIENT_API_TOKEN");
        std::env::remove_var("MODEL_CLIENT_BASE_URL");
        std::env::remove_var("MODEL_CLIENT_POLL_INTERVAL_MS");
    }
}
