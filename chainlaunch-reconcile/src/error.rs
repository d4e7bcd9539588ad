//! Error types.

use thiserror::Error;

/// Errors returned by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The remote service answered with a 404-equivalent.
    #[error("not found: {path}: {message}")]
    NotFound { path: String, message: String },

    /// Any other non-success response. `payload` holds the structured part
    /// of the body when the service sent one.
    #[error("request failed with status {status}: {message}")]
    Status {
        status: u16,
        message: String,
        payload: Option<serde_json::Value>,
    },

    /// Network or connection failure, nothing came back.
    #[error("connection error: {0}")]
    Connection(String),

    /// The response could not be read.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::NotFound { .. })
    }

    /// Human-readable message, without the structured payload.
    pub fn message(&self) -> String {
        match self {
            TransportError::NotFound { message, .. } => message.clone(),
            TransportError::Status { message, .. } => message.clone(),
            TransportError::Connection(msg) | TransportError::Decode(msg) => msg.clone(),
        }
    }
}

/// Errors that abort an operation. Nothing is persisted when one of these is
/// returned from a create.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The resource no longer exists remotely.
    #[error("resource {0} not found")]
    NotFound(String),

    /// The remote service rejected a create and persisted nothing.
    #[error("creation failed at stage {stage}: {message}")]
    CreationFailed { stage: String, message: String },

    /// A response body could not be turned into an entity.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The caller aborted the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The resource type does not support the requested operation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A plan attribute the API cannot accept.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Local state could not be read or written.
    #[error("state error: {0}")]
    State(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;
