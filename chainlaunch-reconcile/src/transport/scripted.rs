//! In-memory transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{Method, Transport};
use crate::error::TransportError;

type Reply = Result<Vec<u8>, TransportError>;

/// Replays queued replies per (method, path). The last reply for a route is
/// repeated once the queue is down to one entry.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    calls: Mutex<Vec<(Method, String, Option<Value>)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn ok(&self, method: Method, path: &str, body: Value) -> &Self {
        self.reply(method, path, Ok(body.to_string().into_bytes()))
    }

    pub fn calls(&self) -> Vec<(Method, String, Option<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, p, _)| *m == method && p == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Reply {
        self.calls
            .lock()
            .unwrap()
            .push((method, path.to_string(), body.cloned()));

        let mut replies = self.replies.lock().unwrap();
        let queue = replies
            .get_mut(&(method, path.to_string()))
            .ok_or_else(|| TransportError::Connection(format!("no reply for {} {}", method, path)))?;

        if queue.len() > 1 {
            return queue.pop_front().unwrap();
        }
        match queue.front() {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(e)) => Err(clone_error(e)),
            None => Err(TransportError::Connection(format!("no reply for {} {}", method, path))),
        }
    }
}

fn clone_error(e: &TransportError) -> TransportError {
    match e {
        TransportError::NotFound { path, message } => TransportError::NotFound {
            path: path.clone(),
            message: message.clone(),
        },
        TransportError::Status {
            status,
            message,
            payload,
        } => TransportError::Status {
            status: *status,
            message: message.clone(),
            payload: payload.clone(),
        },
        TransportError::Connection(m) => TransportError::Connection(m.clone()),
        TransportError::Decode(m) => TransportError::Decode(m.clone()),
    }
}
