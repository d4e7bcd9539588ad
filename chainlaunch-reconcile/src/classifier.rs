//! Classifies the result of a create call.
//!
//! Some creates fail after the remote side already stored the entity, e.g. a
//! node row exists but its container did not start. The API then answers
//! with an error whose body carries
//! `{"details": {"node_created": true, "node_id": 42, "stage": "..."}}`.
//! Such an entity must end up in state so it can be updated or deleted
//! later; an error with `node_created: false` must not.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, TransportError};
use crate::outcome::Outcome;

/// Structured failure payload. Both snake_case and camelCase keys occur.
#[derive(Debug, Default, Deserialize)]
struct FailureDetails {
    #[serde(default, alias = "nodeCreated", alias = "created")]
    node_created: Option<bool>,
    #[serde(default, alias = "nodeId")]
    node_id: Option<Value>,
    #[serde(default)]
    stage: Option<String>,
    #[serde(default, alias = "entity")]
    node: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

impl FailureDetails {
    fn is_empty(&self) -> bool {
        self.node_created.is_none()
            && self.node_id.is_none()
            && self.stage.is_none()
            && self.node.is_none()
    }

    /// Id of the persisted entity, from `node_id` or the embedded entity.
    fn entity_id(&self) -> Option<String> {
        self.node_id
            .as_ref()
            .and_then(id_from_value)
            .or_else(|| self.node.as_ref().and_then(|n| n.get("id")).and_then(id_from_value))
    }
}

/// Turn a JSON id (number or string) into a non-zero, non-empty string.
pub(crate) fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(0) => None,
            _ => Some(n.to_string()),
        },
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty() && s != "0").then(|| s.to_string())
        }
        _ => None,
    }
}

/// Classify the raw result of a create call into an [`Outcome`].
pub fn classify<T: DeserializeOwned>(result: Result<Vec<u8>, TransportError>) -> Outcome<T> {
    let err = match result {
        Ok(body) => {
            // Some endpoints acknowledge with an empty body.
            let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
                b"{}"
            } else {
                &body
            };
            return match serde_json::from_slice::<T>(body) {
                Ok(entity) => Outcome::Success(entity),
                Err(e) => Outcome::HardFailure(Error::Parse(e.to_string())),
            };
        }
        Err(err) => err,
    };

    let details = match failure_details(&err) {
        Some(details) => details,
        None => {
            debug!(error = %err, "Create failed without structured details");
            return Outcome::HardFailure(err.into());
        }
    };

    let stage = details
        .stage
        .clone()
        .unwrap_or_else(|| "unknown".to_string());
    let message = details.message.clone().unwrap_or_else(|| err.message());

    if details.node_created == Some(false) {
        return Outcome::HardFailure(Error::CreationFailed { stage, message });
    }

    let id = details.entity_id();
    let created = details.node_created == Some(true) || id.is_some();
    match (created, id) {
        (true, Some(id)) => {
            let entity = details
                .node
                .and_then(|node| serde_json::from_value::<T>(node).ok());
            warn!(id = %id, stage = %stage, "Create partially failed, remote entity exists");
            let warning = format!(
                "Entity {} was persisted remotely but stage \"{}\" failed: {}. \
                 It is kept in state so it can be inspected, updated or deleted.",
                id, stage, message
            );
            Outcome::PartialSuccess {
                id,
                entity,
                stage,
                warning,
            }
        }
        (true, None) => Outcome::HardFailure(Error::CreationFailed {
            stage,
            message: format!("{} (entity reported as created but no id was returned)", message),
        }),
        (false, _) => Outcome::HardFailure(err.into()),
    }
}

/// Find the structured failure payload, first in the error's payload, then
/// inline in its message.
fn failure_details(err: &TransportError) -> Option<FailureDetails> {
    let TransportError::Status {
        message, payload, ..
    } = err
    else {
        return None;
    };
    payload
        .as_ref()
        .and_then(details_from)
        .or_else(|| embedded_json(message).as_ref().and_then(details_from))
}

/// Failure details under `details`, else at the top level of `payload`.
fn details_from(payload: &Value) -> Option<FailureDetails> {
    let parse = |value: &Value| {
        serde_json::from_value::<FailureDetails>(value.clone())
            .ok()
            .filter(|d| !d.is_empty())
    };
    let mut details = payload
        .get("details")
        .filter(|inner| inner.is_object())
        .and_then(parse)
        .or_else(|| parse(payload))?;
    if details.message.is_none() {
        details.message = payload
            .get("message")
            .or_else(|| payload.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string);
    }
    Some(details)
}

/// Parse the JSON object starting at the first `{` of a message such as
/// `failed to create node: {"details": {...}}`. Trailing text is ignored.
pub fn embedded_json(message: &str) -> Option<Value> {
    let start = message.find('{')?;
    serde_json::Deserializer::from_str(&message[start..])
        .into_iter::<Value>()
        .next()?
        .ok()
        .filter(Value::is_object)
}
