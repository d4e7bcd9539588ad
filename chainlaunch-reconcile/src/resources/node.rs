//! Fabric peer and orderer nodes.
//!
//! Node creation is the main source of partial failures: the node row is
//! written before its container starts, so a failed start still leaves a
//! node that must be tracked.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::{Readiness, Request, Resource};
use crate::error::Result;
use crate::poller::PollConfig;
use crate::reconciler::{computed, immutable, non_empty, reported, requested, submitted};
use crate::transport::Method;

use super::POLL_DELAY;

/// Peer settings. Plans use snake_case keys; the API takes camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct FabricPeerConfig {
    pub organization_id: i64,
    pub msp_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chaincode_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations_listen_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_names: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct FabricOrdererConfig {
    pub organization_id: i64,
    pub msp_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations_listen_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_names: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Platform-specific node settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeConfig {
    FabricPeer(FabricPeerConfig),
    FabricOrderer(FabricOrdererConfig),
}

impl NodeConfig {
    pub fn node_type(&self) -> &'static str {
        match self {
            NodeConfig::FabricPeer(_) => "FABRIC_PEER",
            NodeConfig::FabricOrderer(_) => "FABRIC_ORDERER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePlan {
    pub name: String,
    pub config: NodeConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    blockchain_platform: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fabric_peer: Option<&'a FabricPeerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fabric_orderer: Option<&'a FabricOrdererConfig>,
}

impl<'a> NodeRequest<'a> {
    fn new(name: Option<&'a str>, config: &'a NodeConfig) -> Self {
        let (fabric_peer, fabric_orderer) = match config {
            NodeConfig::FabricPeer(peer) => (Some(peer), None),
            NodeConfig::FabricOrderer(orderer) => (None, Some(orderer)),
        };
        Self {
            name,
            blockchain_platform: "FABRIC",
            fabric_peer,
            fabric_orderer,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRemote {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub tls_cert: Option<String>,
    #[serde(default)]
    pub sign_cert: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: i64,
    pub name: String,
    pub node_type: Option<String>,
    pub config: Option<NodeConfig>,
    pub status: Option<String>,
    pub endpoint: Option<String>,
    pub error_message: Option<String>,
    pub tls_cert: Option<String>,
    pub sign_cert: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Peer and orderer nodes, `/nodes`.
#[derive(Debug, Clone)]
pub struct Node {
    pub poll: PollConfig,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            poll: PollConfig::new(60, POLL_DELAY),
        }
    }
}

impl Resource for Node {
    type Plan = NodePlan;
    type Remote = NodeRemote;
    type Record = NodeRecord;

    fn kind(&self) -> &'static str {
        "node"
    }

    fn create_request(&self, plan: &NodePlan) -> Result<Request> {
        Request::json(
            Method::Post,
            "/nodes",
            &NodeRequest::new(Some(&plan.name), &plan.config),
        )
    }

    fn read_path(&self, id: &str) -> String {
        format!("/nodes/{}", id)
    }

    fn update_request(&self, id: &str, _prior: &NodeRecord, plan: &NodePlan) -> Result<Option<Request>> {
        Request::json(Method::Put, self.read_path(id), &NodeRequest::new(None, &plan.config)).map(Some)
    }

    fn created_id(&self, _plan: &NodePlan, remote: &NodeRemote) -> Option<String> {
        (remote.id != 0).then(|| remote.id.to_string())
    }

    fn record_id(&self, record: &NodeRecord) -> String {
        record.id.to_string()
    }

    fn placeholder(&self, id: &str) -> NodeRemote {
        NodeRemote {
            id: id.parse().unwrap_or_default(),
            ..Default::default()
        }
    }

    fn reconcile(&self, prior: Option<&NodeRecord>, plan: Option<&NodePlan>, remote: NodeRemote) -> NodeRecord {
        let config = requested(plan, prior, |p| Some(p.config.clone()), |r| r.config.clone());
        let node_type = config.as_ref().map(|c| c.node_type().to_string());
        let status_known = non_empty(remote.status.clone()).is_some();

        NodeRecord {
            id: computed(prior.map(|r| r.id), remote.id),
            name: submitted(
                requested(plan, prior, |p| p.name.clone(), |r| r.name.clone()),
                remote.name.unwrap_or_default(),
            ),
            node_type: submitted(node_type, remote.node_type),
            config,
            status: reported(prior.map(|r| r.status.clone()), non_empty(remote.status)),
            endpoint: reported(prior.map(|r| r.endpoint.clone()), non_empty(remote.endpoint)),
            // The message belongs to the status it came with.
            error_message: if status_known {
                non_empty(remote.error_message)
            } else {
                reported(prior.map(|r| r.error_message.clone()), non_empty(remote.error_message))
            },
            tls_cert: computed(prior.map(|r| r.tls_cert.clone()), non_empty(remote.tls_cert)),
            sign_cert: computed(prior.map(|r| r.sign_cert.clone()), non_empty(remote.sign_cert)),
            created_at: immutable(prior.map(|r| r.created_at.clone()), non_empty(remote.created_at)),
            updated_at: reported(prior.map(|r| r.updated_at.clone()), non_empty(remote.updated_at)),
        }
    }

    fn readiness(&self, _record: &NodeRecord) -> Option<Readiness> {
        Some(Readiness::new(&["RUNNING"], &["ERROR"], self.poll))
    }

    /// The node row is stored before its container starts.
    fn partial_create(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelSignal;
    use crate::engine::Engine;
    use crate::error::TransportError;
    use crate::outcome::Phase;
    use crate::transport::scripted::ScriptedTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn peer_plan() -> NodePlan {
        serde_json::from_value(json!({
            "name": "peer0-org1",
            "config": {
                "type": "fabric_peer",
                "organization_id": 1,
                "msp_id": "Org1MSP",
                "mode": "docker",
                "external_endpoint": "peer0.org1.example.com:7051",
                "domain_names": ["peer0.org1.example.com"]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_create_request_body() {
        let request = Node::default().create_request(&peer_plan()).unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.path, "/nodes");
        assert_eq!(
            request.body.unwrap(),
            json!({
                "name": "peer0-org1",
                "blockchainPlatform": "FABRIC",
                "fabricPeer": {
                    "organizationId": 1,
                    "mspId": "Org1MSP",
                    "mode": "docker",
                    "externalEndpoint": "peer0.org1.example.com:7051",
                    "domainNames": ["peer0.org1.example.com"]
                }
            })
        );
    }

    #[test]
    fn test_update_request_omits_name() {
        let node = Node::default();
        let record = node.reconcile(None, Some(&peer_plan()), NodeRemote {
            id: 3,
            ..Default::default()
        });
        let request = node
            .update_request("3", &record, &peer_plan())
            .unwrap()
            .unwrap();
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.path, "/nodes/3");
        assert!(request.body.unwrap().get("name").is_none());
    }

    #[test]
    fn test_error_message_follows_status() {
        let node = Node::default();
        let failed = node.reconcile(None, Some(&peer_plan()), NodeRemote {
            id: 3,
            status: Some("ERROR".to_string()),
            error_message: Some("port in use".to_string()),
            ..Default::default()
        });
        assert_eq!(failed.error_message.as_deref(), Some("port in use"));

        let recovered = node.reconcile(Some(&failed), None, NodeRemote {
            id: 3,
            status: Some("RUNNING".to_string()),
            error_message: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(recovered.error_message, None);

        let unknown = node.reconcile(Some(&failed), None, NodeRemote {
            id: 3,
            ..Default::default()
        });
        assert_eq!(unknown.error_message.as_deref(), Some("port in use"));
        assert_eq!(unknown.status.as_deref(), Some("ERROR"));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let node = Node::default();
        let prior = node.reconcile(None, Some(&peer_plan()), NodeRemote {
            id: 3,
            status: Some("RUNNING".to_string()),
            created_at: Some("2024-01-01T00:00:00Z".to_string()),
            ..Default::default()
        });
        let remote = NodeRemote {
            id: 3,
            name: Some("PEER0-ORG1".to_string()),
            status: Some("STOPPED".to_string()),
            endpoint: Some("peer0.org1.example.com:7051".to_string()),
            created_at: Some("2030-01-01T00:00:00Z".to_string()),
            ..Default::default()
        };

        let once = node.reconcile(Some(&prior), Some(&peer_plan()), remote.clone());
        let twice = node.reconcile(Some(&once), Some(&peer_plan()), remote);
        assert_eq!(once, twice);
        assert_eq!(once.name, "peer0-org1");
        assert_eq!(once.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(once.status.as_deref(), Some("STOPPED"));
    }

    #[tokio::test]
    async fn test_partial_creation_is_saved_and_deletable() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply(
            Method::Post,
            "/nodes",
            Err(TransportError::Status {
                status: 500,
                message: "deploy failed".to_string(),
                payload: Some(json!({
                    "message": "deploy failed",
                    "details": {"node_created": true, "node_id": 42, "stage": "docker-start"}
                })),
            }),
        );
        transport.ok(
            Method::Get,
            "/nodes/42",
            json!({"id": 42, "name": "peer0-org1", "status": "ERROR", "errorMessage": "container exited"}),
        );
        transport.ok(Method::Delete, "/nodes/42", json!({}));
        let engine = Engine::new(transport.clone());
        let node = Node::default();

        let applied = engine
            .create(&node, &peer_plan(), &CancelSignal::never())
            .await
            .unwrap();
        assert_eq!(applied.record.id, 42);
        assert_eq!(applied.phase, Phase::PartialSuccessPending);
        assert!(applied.diagnostics[0].detail.contains("docker-start"));
        assert_eq!(applied.record.error_message.as_deref(), Some("container exited"));

        let id = node.record_id(&applied.record);
        engine.delete(&node, &id).await.unwrap();
        assert_eq!(transport.count(Method::Delete, "/nodes/42"), 1);
    }
}
