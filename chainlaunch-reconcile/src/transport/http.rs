//! reqwest-backed transport.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use super::{Method, Transport};
use crate::config::{Auth, ClientConfig};
use crate::error::{Error, Result, TransportError};

/// Transport that talks HTTP(S) to a Chainlaunch instance.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        let url = self.config.url(path);
        debug!(%method, %url, "Sending request");

        let verb = match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut request = self.client.request(verb, &url);
        request = match &self.config.auth {
            Auth::None => request,
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
            Auth::ApiKey(key) => request.bearer_auth(key),
        };
        if let Some(timeout) = self.config.request_timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Connection(format!("request to {} timed out", url))
            } else {
                TransportError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;

        if status.is_success() {
            return Ok(bytes.to_vec());
        }

        debug!(%method, %url, status = status.as_u16(), "Request failed");
        Err(error_from_response(path, status, &bytes))
    }
}

/// Split an error response into a human message and an optional structured
/// payload.
pub(crate) fn error_from_response(path: &str, status: StatusCode, body: &[u8]) -> TransportError {
    let payload = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .filter(|v| v.is_object());

    let message = payload
        .as_ref()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            (!text.is_empty()).then_some(text)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    if status == StatusCode::NOT_FOUND {
        return TransportError::NotFound {
            path: path.to_string(),
            message,
        };
    }

    TransportError::Status {
        status: status.as_u16(),
        message,
        payload,
    }
}
