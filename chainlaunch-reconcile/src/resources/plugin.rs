//! Plugin deployments. A deployment is addressed by its plugin name; there is
//! no numeric id.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::engine::{Readiness, Request, Resource};
use crate::error::{Error, Result};
use crate::poller::PollConfig;
use crate::reconciler::{computed, non_empty, reported, requested};
use crate::transport::Method;

use super::POLL_DELAY;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PluginDeploymentPlan {
    #[serde(deserialize_with = "plugin_name")]
    pub name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

/// Plugin names are used verbatim as URL path segments.
fn check_name(name: &str) -> std::result::Result<(), String> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(format!(
            "plugin name {:?} must be non-empty and use only letters, digits, '-', '_' or '.'",
            name
        ))
    }
}

fn plugin_name<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let name = String::deserialize(deserializer)?;
    check_name(&name).map_err(serde::de::Error::custom)?;
    Ok(name)
}

#[derive(Serialize)]
struct DeployPlugin<'a> {
    parameters: &'a BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginDeploymentRemote {
    pub status: Option<String>,
    pub project_name: Option<String>,
    pub started_at: Option<String>,
    pub error: Option<String>,
    pub services: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDeploymentRecord {
    pub name: String,
    pub parameters: BTreeMap<String, Value>,
    pub status: Option<String>,
    pub project_name: Option<String>,
    pub started_at: Option<String>,
    pub error: Option<String>,
    pub services: Vec<Value>,
}

/// Deployment of an installed plugin, `/plugins/{name}`.
#[derive(Debug, Clone)]
pub struct PluginDeployment {
    pub poll: PollConfig,
}

impl Default for PluginDeployment {
    fn default() -> Self {
        Self {
            poll: PollConfig::new(10, POLL_DELAY),
        }
    }
}

impl Resource for PluginDeployment {
    type Plan = PluginDeploymentPlan;
    type Remote = PluginDeploymentRemote;
    type Record = PluginDeploymentRecord;

    fn kind(&self) -> &'static str {
        "plugin_deployment"
    }

    fn create_request(&self, plan: &PluginDeploymentPlan) -> Result<Request> {
        check_name(&plan.name).map_err(Error::InvalidPlan)?;
        Request::json(
            Method::Post,
            format!("/plugins/{}/deploy", plan.name),
            &DeployPlugin {
                parameters: &plan.parameters,
            },
        )
    }

    fn read_path(&self, id: &str) -> String {
        format!("/plugins/{}/deployment-status", id)
    }

    /// Redeploying with new parameters replaces the running deployment.
    fn update_request(
        &self,
        id: &str,
        _prior: &PluginDeploymentRecord,
        plan: &PluginDeploymentPlan,
    ) -> Result<Option<Request>> {
        Request::json(
            Method::Post,
            format!("/plugins/{}/deploy", id),
            &DeployPlugin {
                parameters: &plan.parameters,
            },
        )
        .map(Some)
    }

    fn delete_request(&self, id: &str) -> Request {
        Request::new(Method::Post, format!("/plugins/{}/stop", id))
    }

    fn created_id(&self, plan: &PluginDeploymentPlan, _remote: &PluginDeploymentRemote) -> Option<String> {
        non_empty(Some(plan.name.clone()))
    }

    fn record_id(&self, record: &PluginDeploymentRecord) -> String {
        record.name.clone()
    }

    fn placeholder(&self, _id: &str) -> PluginDeploymentRemote {
        PluginDeploymentRemote::default()
    }

    fn reconcile(
        &self,
        prior: Option<&PluginDeploymentRecord>,
        plan: Option<&PluginDeploymentPlan>,
        remote: PluginDeploymentRemote,
    ) -> PluginDeploymentRecord {
        let status_known = non_empty(remote.status.clone()).is_some();
        PluginDeploymentRecord {
            name: requested(plan, prior, |p| p.name.clone(), |r| r.name.clone()),
            parameters: requested(plan, prior, |p| p.parameters.clone(), |r| r.parameters.clone()),
            status: reported(prior.map(|r| r.status.clone()), non_empty(remote.status)),
            project_name: computed(prior.map(|r| r.project_name.clone()), non_empty(remote.project_name)),
            started_at: reported(prior.map(|r| r.started_at.clone()), non_empty(remote.started_at)),
            error: if status_known {
                non_empty(remote.error)
            } else {
                reported(prior.map(|r| r.error.clone()), non_empty(remote.error))
            },
            services: reported(prior.map(|r| r.services.clone()), remote.services),
        }
    }

    fn readiness(&self, _record: &PluginDeploymentRecord) -> Option<Readiness> {
        Some(Readiness::new(&["deployed"], &["failed"], self.poll))
    }
}
