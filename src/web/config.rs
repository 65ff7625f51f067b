//! Web server configuration.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What a scrape returns while the bridge is unreachable or a poll fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScrapePolicy {
    /// Keep serving the last successful poll's samples.
    ///
    /// Scrapes succeed with stale data until the bridge recovers.
    ServeStale,
    /// Fail the scrape with HTTP 500 and no samples.
    Fail,
}

impl Default for ScrapePolicy {
    fn default() -> Self {
        Self::ServeStale
    }
}

impl FromStr for ScrapePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serve-stale" => Ok(Self::ServeStale),
            "fail" => Ok(Self::Fail),
            other => Err(format!(
                "unknown scrape policy '{}' (expected 'serve-stale' or 'fail')",
                other
            )),
        }
    }
}

/// Basic-auth credentials guarding the HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicAuth {
    pub user: String,
    pub password: String,
}

/// Configuration for the web server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Host to bind the server to
    pub host: String,
    /// Port to bind the server to
    pub port: u16,
    /// Optional basic-auth credentials; open access when unset
    pub auth: Option<BasicAuth>,
    /// Behavior when a poll fails
    pub on_error: ScrapePolicy,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: crate::DEFAULT_LISTEN_PORT,
            auth: None,
            on_error: ScrapePolicy::default(),
        }
    }
}

impl WebConfig {
    /// Create a new web configuration with custom host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the basic-auth credentials.
    pub fn with_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(BasicAuth {
            user: user.into(),
            password: password.into(),
        });
        self
    }

    /// Set the failed-poll scrape policy.
    pub fn with_scrape_policy(mut self, policy: ScrapePolicy) -> Self {
        self.on_error = policy;
        self
    }

    /// Get the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
