//! Transport to the Chainlaunch REST API.
//!
//! The engine only sees the [`Transport`] trait; [`HttpTransport`] is the
//! reqwest-backed implementation used in production.

pub mod http;
#[cfg(test)]
pub(crate) mod scripted;

use std::fmt;

use async_trait::async_trait;

use crate::error::TransportError;

pub use http::HttpTransport;

/// HTTP verbs used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// Sends one request and returns the raw response body.
///
/// `path` is relative to the API base (e.g. `/nodes/42`).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Vec<u8>, TransportError>;
}
