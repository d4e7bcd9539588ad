use serde::{Deserialize, Serialize};

use crate::engine::{Request, Resource};
use crate::error::Result;
use crate::reconciler::{computed, immutable, non_empty, reported, requested, submitted};
use crate::transport::Method;

/// Key algorithms accepted by the key service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyAlgorithm {
    Rsa,
    Ec,
    Ed25519,
}

impl KeyAlgorithm {
    /// Parse an algorithm name as reported by the API. Unknown names are `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "RSA" => Some(Self::Rsa),
            "EC" | "ECDSA" => Some(Self::Ec),
            "ED25519" => Some(Self::Ed25519),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct KeyPlan {
    pub name: String,
    pub algorithm: KeyAlgorithm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ca: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyRemote {
    pub id: i64,
    pub name: Option<String>,
    pub algorithm: Option<String>,
    pub key_size: Option<u32>,
    pub curve: Option<String>,
    pub provider_id: Option<i64>,
    pub description: Option<String>,
    pub public_key: Option<String>,
    pub certificate: Option<String>,
    pub sha256_fingerprint: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub id: i64,
    pub name: String,
    pub algorithm: Option<KeyAlgorithm>,
    pub key_size: Option<u32>,
    pub curve: Option<String>,
    pub provider_id: Option<i64>,
    pub description: Option<String>,
    pub public_key: Option<String>,
    pub certificate: Option<String>,
    pub sha256_fingerprint: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
}

/// Cryptographic keys, `/keys`. Keys are immutable; a changed plan needs a
/// replacement.
#[derive(Debug, Clone, Default)]
pub struct Key;

impl Resource for Key {
    type Plan = KeyPlan;
    type Remote = KeyRemote;
    type Record = KeyRecord;

    fn kind(&self) -> &'static str {
        "key"
    }

    fn create_request(&self, plan: &KeyPlan) -> Result<Request> {
        Request::json(Method::Post, "/keys", plan)
    }

    fn read_path(&self, id: &str) -> String {
        format!("/keys/{}", id)
    }

    fn created_id(&self, _plan: &KeyPlan, remote: &KeyRemote) -> Option<String> {
        (remote.id != 0).then(|| remote.id.to_string())
    }

    fn record_id(&self, record: &KeyRecord) -> String {
        record.id.to_string()
    }

    fn placeholder(&self, id: &str) -> KeyRemote {
        KeyRemote {
            id: id.parse().unwrap_or_default(),
            ..Default::default()
        }
    }

    fn reconcile(&self, prior: Option<&KeyRecord>, plan: Option<&KeyPlan>, remote: KeyRemote) -> KeyRecord {
        KeyRecord {
            id: computed(prior.map(|r| r.id), remote.id),
            name: submitted(
                requested(plan, prior, |p| p.name.clone(), |r| r.name.clone()),
                remote.name.unwrap_or_default(),
            ),
            algorithm: requested(plan, prior, |p| Some(p.algorithm), |r| r.algorithm)
                .or_else(|| remote.algorithm.and_then(|a| KeyAlgorithm::parse(&a))),
            key_size: submitted(requested(plan, prior, |p| p.key_size, |r| r.key_size), remote.key_size),
            curve: submitted(
                requested(plan, prior, |p| p.curve.clone(), |r| r.curve.clone()),
                non_empty(remote.curve),
            ),
            provider_id: submitted(
                requested(plan, prior, |p| p.provider_id, |r| r.provider_id),
                remote.provider_id,
            ),
            description: submitted(
                requested(plan, prior, |p| p.description.clone(), |r| r.description.clone()),
                non_empty(remote.description),
            ),
            public_key: computed(prior.map(|r| r.public_key.clone()), non_empty(remote.public_key)),
            certificate: computed(prior.map(|r| r.certificate.clone()), non_empty(remote.certificate)),
            sha256_fingerprint: computed(
                prior.map(|r| r.sha256_fingerprint.clone()),
                non_empty(remote.sha256_fingerprint),
            ),
            status: reported(prior.map(|r| r.status.clone()), non_empty(remote.status)),
            created_at: immutable(prior.map(|r| r.created_at.clone()), non_empty(remote.created_at)),
        }
    }
}
