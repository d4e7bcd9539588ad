use serde::{Deserialize, Serialize};

use crate::engine::{Readiness, Request, Resource};
use crate::error::Result;
use crate::poller::PollConfig;
use crate::reconciler::{computed, immutable, non_empty, reported, requested, submitted};
use crate::transport::Method;

use super::POLL_DELAY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProviderType {
    #[default]
    Database,
    Vault,
}

/// Vault settings. A managed instance is started by Chainlaunch itself and
/// takes a while to come up.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct VaultConfig {
    #[serde(default)]
    pub managed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyProviderPlan {
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub vault: Option<VaultConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateKeyProvider<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    provider_type: ProviderType,
    is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<&'a VaultConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyProviderRemote {
    pub id: i64,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub provider_type: Option<ProviderType>,
    pub is_default: Option<bool>,
    pub status: Option<String>,
    pub endpoint: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyProviderRecord {
    pub id: i64,
    pub name: String,
    pub provider_type: ProviderType,
    pub is_default: bool,
    pub vault: Option<VaultConfig>,
    pub status: Option<String>,
    pub endpoint: Option<String>,
    pub created_at: Option<String>,
}

impl KeyProviderRecord {
    fn is_managed_vault(&self) -> bool {
        self.provider_type == ProviderType::Vault && self.vault.as_ref().is_some_and(|v| v.managed)
    }
}

/// Key providers, `/key-providers`.
#[derive(Debug, Clone)]
pub struct KeyProvider {
    pub poll: PollConfig,
}

impl Default for KeyProvider {
    fn default() -> Self {
        Self {
            poll: PollConfig::new(60, POLL_DELAY),
        }
    }
}

impl Resource for KeyProvider {
    type Plan = KeyProviderPlan;
    type Remote = KeyProviderRemote;
    type Record = KeyProviderRecord;

    fn kind(&self) -> &'static str {
        "key_provider"
    }

    fn create_request(&self, plan: &KeyProviderPlan) -> Result<Request> {
        Request::json(
            Method::Post,
            "/key-providers",
            &CreateKeyProvider {
                name: &plan.name,
                provider_type: plan.provider_type,
                is_default: plan.is_default,
                config: plan.vault.as_ref(),
            },
        )
    }

    fn read_path(&self, id: &str) -> String {
        format!("/key-providers/{}", id)
    }

    fn created_id(&self, _plan: &KeyProviderPlan, remote: &KeyProviderRemote) -> Option<String> {
        (remote.id != 0).then(|| remote.id.to_string())
    }

    fn record_id(&self, record: &KeyProviderRecord) -> String {
        record.id.to_string()
    }

    fn placeholder(&self, id: &str) -> KeyProviderRemote {
        KeyProviderRemote {
            id: id.parse().unwrap_or_default(),
            ..Default::default()
        }
    }

    fn reconcile(
        &self,
        prior: Option<&KeyProviderRecord>,
        plan: Option<&KeyProviderPlan>,
        remote: KeyProviderRemote,
    ) -> KeyProviderRecord {
        KeyProviderRecord {
            id: computed(prior.map(|r| r.id), remote.id),
            name: submitted(
                requested(plan, prior, |p| p.name.clone(), |r| r.name.clone()),
                remote.name.unwrap_or_default(),
            ),
            provider_type: requested(plan, prior, |p| Some(p.provider_type), |r| Some(r.provider_type))
                .or(remote.provider_type)
                .unwrap_or_default(),
            is_default: requested(plan, prior, |p| Some(p.is_default), |r| Some(r.is_default))
                .or(remote.is_default)
                .unwrap_or_default(),
            // Vault credentials are never returned.
            vault: requested(plan, prior, |p| p.vault.clone(), |r| r.vault.clone()),
            status: reported(prior.map(|r| r.status.clone()), non_empty(remote.status)),
            endpoint: reported(prior.map(|r| r.endpoint.clone()), non_empty(remote.endpoint)),
            created_at: immutable(prior.map(|r| r.created_at.clone()), non_empty(remote.created_at)),
        }
    }

    fn readiness(&self, record: &KeyProviderRecord) -> Option<Readiness> {
        record
            .is_managed_vault()
            .then(|| Readiness::new(&["RUNNING"], &["ERROR"], self.poll))
    }
}
