use serde::{Deserialize, Serialize};

use crate::engine::{Request, Resource};
use crate::error::Result;
use crate::reconciler::{computed, immutable, non_empty, reported, requested, submitted};
use crate::transport::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BackupTargetType {
    #[default]
    S3,
}

/// Snake_case in plans, camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct BackupTargetPlan {
    pub name: String,
    #[serde(rename = "type", default)]
    pub target_type: BackupTargetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub bucket_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_path: Option<String>,
    pub access_key_id: String,
    pub secret_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_path_style: Option<bool>,
    pub restic_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackupTargetRemote {
    pub id: i64,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub target_type: Option<BackupTargetType>,
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub bucket_name: Option<String>,
    pub bucket_path: Option<String>,
    pub access_key_id: Option<String>,
    pub force_path_style: Option<bool>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupTargetRecord {
    pub id: i64,
    pub name: String,
    pub target_type: BackupTargetType,
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub bucket_name: String,
    pub bucket_path: Option<String>,
    pub access_key_id: String,
    pub secret_key: String,
    pub force_path_style: Option<bool>,
    pub restic_password: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// S3 backup destinations, `/backups/targets`.
#[derive(Debug, Clone, Default)]
pub struct BackupTarget;

impl Resource for BackupTarget {
    type Plan = BackupTargetPlan;
    type Remote = BackupTargetRemote;
    type Record = BackupTargetRecord;

    fn kind(&self) -> &'static str {
        "backup_target"
    }

    fn create_request(&self, plan: &BackupTargetPlan) -> Result<Request> {
        Request::json(Method::Post, "/backups/targets", plan)
    }

    fn read_path(&self, id: &str) -> String {
        format!("/backups/targets/{}", id)
    }

    fn update_request(
        &self,
        id: &str,
        _prior: &BackupTargetRecord,
        plan: &BackupTargetPlan,
    ) -> Result<Option<Request>> {
        Request::json(Method::Put, self.read_path(id), plan).map(Some)
    }

    fn created_id(&self, _plan: &BackupTargetPlan, remote: &BackupTargetRemote) -> Option<String> {
        (remote.id != 0).then(|| remote.id.to_string())
    }

    fn record_id(&self, record: &BackupTargetRecord) -> String {
        record.id.to_string()
    }

    fn placeholder(&self, id: &str) -> BackupTargetRemote {
        BackupTargetRemote {
            id: id.parse().unwrap_or_default(),
            ..Default::default()
        }
    }

    fn reconcile(
        &self,
        prior: Option<&BackupTargetRecord>,
        plan: Option<&BackupTargetPlan>,
        remote: BackupTargetRemote,
    ) -> BackupTargetRecord {
        let text = |from_plan: fn(&BackupTargetPlan) -> String, from_prior: fn(&BackupTargetRecord) -> String| {
            requested(plan, prior, from_plan, from_prior)
        };
        let optional = |from_plan: fn(&BackupTargetPlan) -> Option<String>,
                        from_prior: fn(&BackupTargetRecord) -> Option<String>| {
            requested(plan, prior, from_plan, from_prior)
        };

        BackupTargetRecord {
            id: computed(prior.map(|r| r.id), remote.id),
            name: submitted(text(|p| p.name.clone(), |r| r.name.clone()), remote.name.unwrap_or_default()),
            target_type: requested(plan, prior, |p| Some(p.target_type), |r| Some(r.target_type))
                .or(remote.target_type)
                .unwrap_or_default(),
            endpoint: submitted(optional(|p| p.endpoint.clone(), |r| r.endpoint.clone()), non_empty(remote.endpoint)),
            region: submitted(optional(|p| p.region.clone(), |r| r.region.clone()), non_empty(remote.region)),
            bucket_name: submitted(
                text(|p| p.bucket_name.clone(), |r| r.bucket_name.clone()),
                remote.bucket_name.unwrap_or_default(),
            ),
            bucket_path: submitted(
                optional(|p| p.bucket_path.clone(), |r| r.bucket_path.clone()),
                non_empty(remote.bucket_path),
            ),
            access_key_id: submitted(
                text(|p| p.access_key_id.clone(), |r| r.access_key_id.clone()),
                remote.access_key_id.unwrap_or_default(),
            ),
            // Secrets are write-only on the API side.
            secret_key: text(|p| p.secret_key.clone(), |r| r.secret_key.clone()),
            restic_password: text(|p| p.restic_password.clone(), |r| r.restic_password.clone()),
            force_path_style: submitted(
                requested(plan, prior, |p| p.force_path_style, |r| r.force_path_style),
                remote.force_path_style,
            ),
            created_at: immutable(prior.map(|r| r.created_at.clone()), non_empty(remote.created_at)),
            updated_at: reported(prior.map(|r| r.updated_at.clone()), non_empty(remote.updated_at)),
        }
    }
}
