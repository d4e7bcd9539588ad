//! Generic create/read/update/delete engine.
//!
//! Every resource type runs through the same control flow; a [`Resource`]
//! implementation only supplies paths, request bodies, the merge of a remote
//! entity into a record, and optional readiness settings.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cancel::CancelSignal;
use crate::classifier::classify;
use crate::error::{Error, Result};
use crate::outcome::{Applied, Diagnostic, Outcome, Phase};
use crate::poller::{PollConfig, PollOutcome, Poller, StatusSource, TerminalStates};
use crate::transport::{Method, Transport};

/// One API call.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    /// Request with a JSON body serialized from `body`.
    pub fn json<T: Serialize>(method: Method, path: impl Into<String>, body: &T) -> Result<Self> {
        Ok(Self {
            method,
            path: path.into(),
            body: Some(serde_json::to_value(body)?),
        })
    }
}

/// How to wait for a resource after it was created or updated.
#[derive(Debug, Clone)]
pub struct Readiness {
    pub terminal: TerminalStates,
    pub poll: PollConfig,
    /// Field of the status response holding the status string.
    pub status_field: &'static str,
}

impl Readiness {
    pub fn new(success: &[&str], failure: &[&str], poll: PollConfig) -> Self {
        Self {
            terminal: TerminalStates::new(success, failure),
            poll,
            status_field: "status",
        }
    }
}

/// A resource type managed through the engine.
pub trait Resource: Send + Sync {
    /// User-supplied attributes.
    type Plan: DeserializeOwned + Send + Sync;
    /// Entity as returned by the API.
    type Remote: DeserializeOwned + Send;
    /// Persisted representation.
    type Record: Clone + Serialize + DeserializeOwned + PartialEq + Send + Sync;

    /// Short name for logs and state files.
    fn kind(&self) -> &'static str;

    fn create_request(&self, plan: &Self::Plan) -> Result<Request>;

    fn read_path(&self, id: &str) -> String;

    /// `None` when the resource cannot be changed in place.
    fn update_request(
        &self,
        _id: &str,
        _prior: &Self::Record,
        _plan: &Self::Plan,
    ) -> Result<Option<Request>> {
        Ok(None)
    }

    fn delete_request(&self, id: &str) -> Request {
        Request::new(Method::Delete, self.read_path(id))
    }

    /// Id of a freshly created entity.
    fn created_id(&self, plan: &Self::Plan, remote: &Self::Remote) -> Option<String>;

    fn record_id(&self, record: &Self::Record) -> String;

    /// Minimal entity for an id whose details could not be fetched.
    fn placeholder(&self, id: &str) -> Self::Remote;

    /// Merge a remote entity into the record to persist. `prior` is the
    /// previously persisted record, `plan` the submitted attributes (absent
    /// on plain reads).
    fn reconcile(
        &self,
        prior: Option<&Self::Record>,
        plan: Option<&Self::Plan>,
        remote: Self::Remote,
    ) -> Self::Record;

    fn readiness(&self, _record: &Self::Record) -> Option<Readiness> {
        None
    }

    /// Whether a failed create may still have persisted the entity. Only
    /// then is the error body searched for a created entity.
    fn partial_create(&self) -> bool {
        false
    }

    fn status_path(&self, id: &str) -> String {
        self.read_path(id)
    }
}

/// Reads a status string from a JSON endpoint.
struct StatusEndpoint<'a> {
    transport: &'a dyn Transport,
    path: String,
    field: &'static str,
}

#[async_trait]
impl StatusSource for StatusEndpoint<'_> {
    async fn fetch_status(&self, _id: &str) -> Result<String> {
        let body = self.transport.send(Method::Get, &self.path, None).await?;
        let value: Value = serde_json::from_slice(&body)?;
        Ok(value
            .get(self.field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

/// Runs resource operations against one transport.
pub struct Engine {
    transport: Arc<dyn Transport>,
    poll_override: Option<PollConfig>,
}

impl Engine {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            poll_override: None,
        }
    }

    /// Use `poll` instead of every resource's own readiness budget.
    pub fn with_poll_override(mut self, poll: PollConfig) -> Self {
        self.poll_override = Some(poll);
        self
    }

    /// Create a resource. `Err` means nothing exists remotely; once the
    /// remote side has the entity, a record is always returned and later
    /// problems become diagnostics.
    pub async fn create<R: Resource>(
        &self,
        resource: &R,
        plan: &R::Plan,
        cancel: &CancelSignal,
    ) -> Result<Applied<R::Record>> {
        let kind = resource.kind();
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let request = resource.create_request(plan)?;
        info!(kind, path = %request.path, "Creating resource");
        let result = self
            .transport
            .send(request.method, &request.path, request.body.as_ref())
            .await;

        let outcome = match result {
            Err(e) if !resource.partial_create() => Outcome::HardFailure(e.into()),
            result => classify::<R::Remote>(result),
        };
        match outcome {
            Outcome::HardFailure(e) => {
                error!(kind, error = %e, "Create failed, nothing was persisted");
                Err(e)
            }
            Outcome::Success(remote) => {
                let id = resource.created_id(plan, &remote).ok_or_else(|| {
                    Error::Parse(format!("create response for {} carried no id", kind))
                })?;
                info!(kind, id = %id, "Resource created");
                let record = resource.reconcile(None, Some(plan), remote);
                self.settle(resource, record, Some(plan), cancel).await
            }
            Outcome::PartialSuccess {
                id,
                entity,
                stage,
                warning,
            } => {
                let mut diagnostics = Vec::new();
                let remote = match entity {
                    Some(remote) => remote,
                    None => match self.fetch(resource, &id).await {
                        Ok(remote) => remote,
                        Err(e) => {
                            warn!(kind, id = %id, error = %e, "Could not read partially created resource");
                            diagnostics.push(Diagnostic::warning(
                                format!("Could not read {} {}", kind, id),
                                format!("Only the id is known: {}", e),
                            ));
                            resource.placeholder(&id)
                        }
                    },
                };
                let record = resource.reconcile(None, Some(plan), remote);
                let mut applied = Applied::new(record, Phase::PartialSuccessPending);
                applied.diagnostics.push(Diagnostic::warning(
                    format!("{} {} partially created (stage {})", kind, id, stage),
                    warning,
                ));
                applied.diagnostics.extend(diagnostics);
                Ok(applied)
            }
        }
    }

    /// Read the current remote state. `Ok(None)` when the resource is gone
    /// and should be dropped from state.
    pub async fn read<R: Resource>(
        &self,
        resource: &R,
        id: &str,
        prior: Option<&R::Record>,
    ) -> Result<Option<R::Record>> {
        match self.fetch(resource, id).await {
            Ok(remote) => Ok(Some(resource.reconcile(prior, None, remote))),
            Err(Error::NotFound(_)) => {
                info!(kind = resource.kind(), id, "Resource no longer exists remotely");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Update in place. On `Err` the prior record stays authoritative.
    pub async fn update<R: Resource>(
        &self,
        resource: &R,
        prior: &R::Record,
        plan: &R::Plan,
        cancel: &CancelSignal,
    ) -> Result<Applied<R::Record>> {
        let kind = resource.kind();
        let id = resource.record_id(prior);
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let request = resource.update_request(&id, prior, plan)?.ok_or_else(|| {
            Error::Unsupported(format!("{} cannot be updated in place", kind))
        })?;
        info!(kind, id = %id, "Updating resource");

        let body = self
            .transport
            .send(request.method, &request.path, request.body.as_ref())
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    Error::NotFound(id.clone())
                } else {
                    e.into()
                }
            })?;

        let remote = if body.iter().all(u8::is_ascii_whitespace) {
            debug!(kind, id = %id, "Empty update response, reading back");
            self.fetch(resource, &id).await?
        } else {
            serde_json::from_slice::<R::Remote>(&body)?
        };

        let record = resource.reconcile(Some(prior), Some(plan), remote);
        self.settle(resource, record, Some(plan), cancel).await
    }

    /// Delete a resource. A resource that is already gone counts as deleted.
    pub async fn delete<R: Resource>(&self, resource: &R, id: &str) -> Result<()> {
        let kind = resource.kind();
        let request = resource.delete_request(id);
        info!(kind, id, "Deleting resource");

        match self
            .transport
            .send(request.method, &request.path, request.body.as_ref())
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                info!(kind, id, "Resource already deleted");
                Ok(())
            }
            Err(e) => {
                error!(kind, id, error = %e, "Delete failed");
                Err(e.into())
            }
        }
    }

    /// Wait for an existing resource to become ready and refresh its record.
    pub async fn wait_ready<R: Resource>(
        &self,
        resource: &R,
        record: &R::Record,
        cancel: &CancelSignal,
    ) -> Result<Applied<R::Record>> {
        self.settle(resource, record.clone(), None, cancel).await
    }

    async fn fetch<R: Resource>(&self, resource: &R, id: &str) -> Result<R::Remote> {
        let path = resource.read_path(id);
        let body = self
            .transport
            .send(Method::Get, &path, None)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    Error::NotFound(id.to_string())
                } else {
                    e.into()
                }
            })?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Poll readiness if the resource has any, then refresh the record.
    async fn settle<R: Resource>(
        &self,
        resource: &R,
        record: R::Record,
        plan: Option<&R::Plan>,
        cancel: &CancelSignal,
    ) -> Result<Applied<R::Record>> {
        let Some(readiness) = resource.readiness(&record) else {
            return Ok(Applied::new(record, Phase::Ready));
        };

        let kind = resource.kind();
        let id = resource.record_id(&record);
        let poll = self.poll_override.unwrap_or(readiness.poll);
        let poller = Poller::new(poll, readiness.terminal);
        let source = StatusEndpoint {
            transport: self.transport.as_ref(),
            path: resource.status_path(&id),
            field: readiness.status_field,
        };

        let mut diagnostics = Vec::new();
        let phase = match poller.wait(&source, &id, cancel).await {
            Ok(PollOutcome::Ready { .. }) => Phase::Ready,
            Ok(PollOutcome::Failed { attempts, status }) => {
                diagnostics.push(Diagnostic::error(
                    format!("{} {} failed to become ready", kind, id),
                    format!(
                        "Status {} after {} check(s). The resource exists and was saved.",
                        status, attempts
                    ),
                ));
                Phase::Failed
            }
            Ok(PollOutcome::TimedOut {
                attempts,
                last_status,
            }) => {
                diagnostics.push(Diagnostic::warning(
                    format!("{} {} did not confirm readiness", kind, id),
                    format!(
                        "Still {} after {} attempt(s) over {:?}. The resource was saved and may still become ready.",
                        last_status.as_deref().unwrap_or("unknown"),
                        attempts,
                        poll.ceiling()
                    ),
                ));
                Phase::Pending
            }
            Err(Error::Cancelled) => {
                warn!(kind, id = %id, "Wait cancelled");
                let mut applied = Applied::new(record, Phase::Pending);
                applied.diagnostics.push(Diagnostic::error(
                    format!("Waiting for {} {} was cancelled", kind, id),
                    "The resource exists and was saved; its readiness is unknown.",
                ));
                return Ok(applied);
            }
            Err(e) => {
                warn!(kind, id = %id, error = %e, "Status check failed");
                diagnostics.push(Diagnostic::warning(
                    format!("Could not check status of {} {}", kind, id),
                    e.to_string(),
                ));
                Phase::Pending
            }
        };

        let record = match self.fetch(resource, &id).await {
            Ok(remote) => resource.reconcile(Some(&record), plan, remote),
            Err(e) => {
                warn!(kind, id = %id, error = %e, "Refresh after wait failed");
                diagnostics.push(Diagnostic::warning(
                    format!("Could not refresh {} {}", kind, id),
                    e.to_string(),
                ));
                record
            }
        };

        Ok(Applied {
            record,
            phase,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::cancel_pair;
    use crate::error::TransportError;
    use crate::outcome::Severity;
    use crate::reconciler::{computed, immutable, reported, requested, submitted};
    use crate::transport::scripted::ScriptedTransport;
    use serde::Deserialize;
    use serde_json::json;
    use std::time::Duration;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct WidgetPlan {
        name: String,
    }

    #[derive(Debug, Default, Deserialize)]
    struct WidgetRemote {
        #[serde(default)]
        id: i64,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        created_at: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct WidgetRecord {
        id: i64,
        name: Option<String>,
        status: Option<String>,
        created_at: Option<String>,
    }

    struct Widget {
        ready: bool,
    }

    impl Resource for Widget {
        type Plan = WidgetPlan;
        type Remote = WidgetRemote;
        type Record = WidgetRecord;

        fn kind(&self) -> &'static str {
            "widget"
        }

        fn create_request(&self, plan: &WidgetPlan) -> Result<Request> {
            Request::json(Method::Post, "/widgets", plan)
        }

        fn read_path(&self, id: &str) -> String {
            format!("/widgets/{}", id)
        }

        fn update_request(
            &self,
            id: &str,
            _prior: &WidgetRecord,
            plan: &WidgetPlan,
        ) -> Result<Option<Request>> {
            Request::json(Method::Put, self.read_path(id), plan).map(Some)
        }

        fn created_id(&self, _plan: &WidgetPlan, remote: &WidgetRemote) -> Option<String> {
            (remote.id != 0).then(|| remote.id.to_string())
        }

        fn record_id(&self, record: &WidgetRecord) -> String {
            record.id.to_string()
        }

        fn placeholder(&self, id: &str) -> WidgetRemote {
            WidgetRemote {
                id: id.parse().unwrap_or_default(),
                ..Default::default()
            }
        }

        fn reconcile(
            &self,
            prior: Option<&WidgetRecord>,
            plan: Option<&WidgetPlan>,
            remote: WidgetRemote,
        ) -> WidgetRecord {
            WidgetRecord {
                id: computed(prior.map(|r| r.id), remote.id),
                name: submitted(
                    requested(plan, prior, |p| Some(p.name.clone()), |r| r.name.clone()),
                    remote.name,
                ),
                status: reported(prior.map(|r| r.status.clone()), remote.status),
                created_at: immutable(prior.map(|r| r.created_at.clone()), remote.created_at),
            }
        }

        fn readiness(&self, _record: &WidgetRecord) -> Option<Readiness> {
            self.ready.then(|| {
                Readiness::new(
                    &["RUNNING"],
                    &["ERROR"],
                    PollConfig::new(5, Duration::from_secs(2)),
                )
            })
        }

        fn partial_create(&self) -> bool {
            true
        }
    }

    fn plan() -> WidgetPlan {
        WidgetPlan {
            name: "w1".to_string(),
        }
    }

    fn engine(transport: &Arc<ScriptedTransport>) -> Engine {
        Engine::new(transport.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_polls_then_refreshes() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok(
            Method::Post,
            "/widgets",
            json!({"id": 42, "name": "w1", "status": "PENDING", "created_at": "2024-01-01T00:00:00Z"}),
        );
        transport
            .ok(Method::Get, "/widgets/42", json!({"id": 42, "status": "PENDING"}))
            .ok(Method::Get, "/widgets/42", json!({"id": 42, "status": "RUNNING"}));

        let applied = engine(&transport)
            .create(&Widget { ready: true }, &plan(), &CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(applied.phase, Phase::Ready);
        assert!(applied.diagnostics.is_empty());
        assert_eq!(applied.record.status.as_deref(), Some("RUNNING"));
        assert_eq!(applied.record.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(applied.record.name.as_deref(), Some("w1"));
        // two status checks plus the final refresh
        assert_eq!(transport.count(Method::Get, "/widgets/42"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_timeout_is_warning() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok(Method::Post, "/widgets", json!({"id": 7, "status": "PENDING"}));
        transport.ok(Method::Get, "/widgets/7", json!({"id": 7, "status": "PENDING"}));

        let applied = engine(&transport)
            .create(&Widget { ready: true }, &plan(), &CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(applied.phase, Phase::Pending);
        assert_eq!(applied.record.id, 7);
        assert_eq!(applied.diagnostics.len(), 1);
        assert_eq!(applied.diagnostics[0].severity, Severity::Warning);
        assert!(!applied.has_errors());
        // five status checks plus the final refresh
        assert_eq!(transport.count(Method::Get, "/widgets/7"), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_failed_status_keeps_record() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok(Method::Post, "/widgets", json!({"id": 8}));
        transport.ok(Method::Get, "/widgets/8", json!({"id": 8, "status": "ERROR"}));

        let applied = engine(&transport)
            .create(&Widget { ready: true }, &plan(), &CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(applied.phase, Phase::Failed);
        assert!(applied.has_errors());
        assert_eq!(applied.record.status.as_deref(), Some("ERROR"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_cancelled_during_wait_keeps_record() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok(Method::Post, "/widgets", json!({"id": 9}));
        transport.ok(Method::Get, "/widgets/9", json!({"id": 9, "status": "PENDING"}));
        let (handle, signal) = cancel_pair();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            handle.cancel();
        });

        let applied = engine(&transport)
            .create(&Widget { ready: true }, &plan(), &signal)
            .await
            .unwrap();

        assert_eq!(applied.phase, Phase::Pending);
        assert_eq!(applied.record.id, 9);
        assert!(applied.has_errors());
        assert_eq!(transport.count(Method::Get, "/widgets/9"), 2);
    }

    #[tokio::test]
    async fn test_create_partial_reads_entity() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply(
            Method::Post,
            "/widgets",
            Err(TransportError::Status {
                status: 500,
                message: "deploy failed".to_string(),
                payload: Some(json!({
                    "message": "deploy failed",
                    "details": {"node_created": true, "node_id": 42, "stage": "docker-start"}
                })),
            }),
        );
        transport.ok(Method::Get, "/widgets/42", json!({"id": 42, "status": "ERROR"}));

        let applied = engine(&transport)
            .create(&Widget { ready: true }, &plan(), &CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(applied.phase, Phase::PartialSuccessPending);
        assert_eq!(applied.record.id, 42);
        assert_eq!(applied.record.name.as_deref(), Some("w1"));
        assert_eq!(applied.warnings().count(), 1);
        // no readiness polling for partial creations
        assert_eq!(transport.count(Method::Get, "/widgets/42"), 1);
    }

    #[tokio::test]
    async fn test_create_partial_without_readable_entity_uses_id() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply(
            Method::Post,
            "/widgets",
            Err(TransportError::Status {
                status: 500,
                message: "failed".to_string(),
                payload: Some(json!({"details": {"node_created": true, "node_id": 5}})),
            }),
        );
        transport.reply(
            Method::Get,
            "/widgets/5",
            Err(TransportError::Connection("reset".to_string())),
        );

        let applied = engine(&transport)
            .create(&Widget { ready: false }, &plan(), &CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(applied.record.id, 5);
        assert_eq!(applied.warnings().count(), 2);
    }

    #[tokio::test]
    async fn test_create_hard_failure_is_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply(
            Method::Post,
            "/widgets",
            Err(TransportError::Status {
                status: 400,
                message: "invalid".to_string(),
                payload: Some(json!({"details": {"node_created": false, "stage": "validation"}})),
            }),
        );

        let err = engine(&transport)
            .create(&Widget { ready: true }, &plan(), &CancelSignal::never())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("validation"));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_create_cancelled_before_send() {
        let transport = Arc::new(ScriptedTransport::new());
        let (handle, signal) = cancel_pair();
        handle.cancel();

        let result = engine(&transport)
            .create(&Widget { ready: false }, &plan(), &signal)
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_read_not_found_drops_state() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply(
            Method::Get,
            "/widgets/3",
            Err(TransportError::NotFound {
                path: "/widgets/3".to_string(),
                message: "not found".to_string(),
            }),
        );

        let record = engine(&transport)
            .read(&Widget { ready: false }, "3", None)
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_read_keeps_unechoed_fields() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok(Method::Get, "/widgets/3", json!({"id": 3, "status": ""}));
        let prior = WidgetRecord {
            id: 3,
            name: Some("w1".to_string()),
            status: Some("RUNNING".to_string()),
            created_at: Some("2024-01-01T00:00:00Z".to_string()),
        };

        let record = engine(&transport)
            .read(&Widget { ready: false }, "3", Some(&prior))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record, prior);
    }

    #[tokio::test]
    async fn test_update_preserves_created_at_and_reads_back_empty_body() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok(Method::Post, "/widgets", json!({"id": 4, "created_at": "2024-01-01T00:00:00Z"}));
        transport.reply(Method::Put, "/widgets/4", Ok(Vec::new()));
        transport.ok(
            Method::Get,
            "/widgets/4",
            json!({"id": 4, "name": "w2", "created_at": "2030-01-01T00:00:00Z"}),
        );
        let engine = engine(&transport);
        let widget = Widget { ready: false };

        let mut record = engine
            .create(&widget, &plan(), &CancelSignal::never())
            .await
            .unwrap()
            .record;
        for name in ["w2", "w3", "w4"] {
            let plan = WidgetPlan {
                name: name.to_string(),
            };
            record = engine
                .update(&widget, &record, &plan, &CancelSignal::never())
                .await
                .unwrap()
                .record;
            assert_eq!(record.name.as_deref(), Some(name));
        }
        assert_eq!(record.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn test_delete_treats_not_found_as_done() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply(
            Method::Delete,
            "/widgets/3",
            Err(TransportError::NotFound {
                path: "/widgets/3".to_string(),
                message: "gone".to_string(),
            }),
        );
        transport.reply(
            Method::Delete,
            "/widgets/4",
            Err(TransportError::Status {
                status: 500,
                message: "boom".to_string(),
                payload: None,
            }),
        );
        let engine = engine(&transport);

        assert!(engine.delete(&Widget { ready: false }, "3").await.is_ok());
        assert!(engine.delete(&Widget { ready: false }, "4").await.is_err());
    }
}
