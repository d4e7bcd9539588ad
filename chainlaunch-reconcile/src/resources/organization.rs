use serde::{Deserialize, Serialize};

use crate::engine::{Request, Resource};
use crate::error::Result;
use crate::reconciler::{computed, immutable, non_empty, reported, requested, submitted};
use crate::transport::Method;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrganizationPlan {
    pub msp_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub provider_id: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrganization<'a> {
    msp_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_id: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateOrganization<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganizationRemote {
    pub id: i64,
    pub msp_id: Option<String>,
    pub description: Option<String>,
    pub provider_id: Option<i64>,
    pub sign_key_id: Option<i64>,
    pub tls_key_id: Option<i64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub id: i64,
    pub msp_id: String,
    pub description: Option<String>,
    pub provider_id: Option<i64>,
    pub sign_key_id: Option<i64>,
    pub tls_key_id: Option<i64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Fabric organizations, `/organizations`.
#[derive(Debug, Clone, Default)]
pub struct Organization;

impl Resource for Organization {
    type Plan = OrganizationPlan;
    type Remote = OrganizationRemote;
    type Record = OrganizationRecord;

    fn kind(&self) -> &'static str {
        "organization"
    }

    fn create_request(&self, plan: &OrganizationPlan) -> Result<Request> {
        Request::json(
            Method::Post,
            "/organizations",
            &CreateOrganization {
                msp_id: &plan.msp_id,
                description: plan.description.as_deref(),
                provider_id: plan.provider_id,
            },
        )
    }

    fn read_path(&self, id: &str) -> String {
        format!("/organizations/{}", id)
    }

    /// The MSP id is fixed at creation; description and provider can change.
    fn update_request(
        &self,
        id: &str,
        _prior: &OrganizationRecord,
        plan: &OrganizationPlan,
    ) -> Result<Option<Request>> {
        Request::json(
            Method::Put,
            self.read_path(id),
            &UpdateOrganization {
                description: plan.description.as_deref(),
                provider_id: plan.provider_id,
            },
        )
        .map(Some)
    }

    fn created_id(&self, _plan: &OrganizationPlan, remote: &OrganizationRemote) -> Option<String> {
        (remote.id != 0).then(|| remote.id.to_string())
    }

    fn record_id(&self, record: &OrganizationRecord) -> String {
        record.id.to_string()
    }

    fn placeholder(&self, id: &str) -> OrganizationRemote {
        OrganizationRemote {
            id: id.parse().unwrap_or_default(),
            ..Default::default()
        }
    }

    fn reconcile(
        &self,
        prior: Option<&OrganizationRecord>,
        plan: Option<&OrganizationPlan>,
        remote: OrganizationRemote,
    ) -> OrganizationRecord {
        OrganizationRecord {
            id: computed(prior.map(|r| r.id), remote.id),
            msp_id: submitted(
                requested(plan, prior, |p| p.msp_id.clone(), |r| r.msp_id.clone()),
                remote.msp_id.unwrap_or_default(),
            ),
            description: submitted(
                requested(plan, prior, |p| p.description.clone(), |r| r.description.clone()),
                non_empty(remote.description),
            ),
            provider_id: submitted(
                requested(plan, prior, |p| p.provider_id, |r| r.provider_id),
                remote.provider_id,
            ),
            sign_key_id: computed(prior.map(|r| r.sign_key_id), remote.sign_key_id),
            tls_key_id: computed(prior.map(|r| r.tls_key_id), remote.tls_key_id),
            created_at: immutable(prior.map(|r| r.created_at.clone()), non_empty(remote.created_at)),
            updated_at: reported(prior.map(|r| r.updated_at.clone()), non_empty(remote.updated_at)),
        }
    }
}
