//! Client configuration.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::poller::PollConfig;

/// Credentials sent with every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Auth {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    /// Sent as a bearer token.
    ApiKey(String),
}

/// Settings for talking to one Chainlaunch instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base, e.g. `http://localhost:8100/api/v1`. Trailing slashes are
    /// stripped.
    pub base_url: String,
    pub auth: Auth,
    /// Per-request timeout. `None` lets a hung request block the operation.
    pub request_timeout: Option<Duration>,
    /// Overrides every resource's default readiness polling when set.
    pub poll: Option<PollConfig>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config("base URL must not be empty".to_string()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "base URL must start with http:// or https://, got {}",
                base_url
            )));
        }
        Ok(Self {
            base_url,
            auth: Auth::None,
            request_timeout: None,
            poll: None,
        })
    }

    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = Some(poll);
        self
    }

    /// Full URL for an API path.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}
