//! Local state file holding one persisted record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::outcome::Phase;

/// Contents of a state file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry<R> {
    pub kind: String,
    pub id: String,
    pub record: R,
    /// Warnings from the operation that produced the record, e.g. a partial
    /// creation. Repeated on refresh until the next apply replaces it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Phase reached by the last apply or wait. Kept as is by refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
}

pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when no state has been written yet.
    pub async fn load<R: DeserializeOwned>(&self) -> Result<Option<StateEntry<R>>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.error("read", e)),
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| self.error("parse", e))
    }

    /// Write through a temporary file next to the target, then rename, so a
    /// crash never leaves a truncated file behind.
    pub async fn save<R: Serialize>(&self, entry: &StateEntry<R>) -> Result<()> {
        let data = serde_json::to_vec_pretty(entry).map_err(|e| self.error("serialize", e))?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &data)
            .await
            .map_err(|e| self.error("write", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.error("rename", e))?;
        debug!(path = %self.path.display(), kind = %entry.kind, id = %entry.id, "State saved");
        Ok(())
    }

    /// Delete the state file. A missing file is not an error.
    pub async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.error("remove", e)),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn error(&self, action: &str, e: impl std::fmt::Display) -> Error {
        Error::State(format!("failed to {} {}: {}", action, self.path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry() -> StateEntry<serde_json::Value> {
        StateEntry {
            kind: "node".to_string(),
            id: "42".to_string(),
            record: json!({"id": 42, "status": "ERROR"}),
            warning: Some("partially created".to_string()),
            phase: Some(Phase::PartialSuccessPending),
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateFile::new(dir.path().join("node.json"));
        let loaded: Option<StateEntry<serde_json::Value>> = state.load().await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateFile::new(dir.path().join("node.json"));

        state.save(&entry()).await.unwrap();
        assert!(!dir.path().join("node.json.tmp").exists());
        assert_eq!(state.load().await.unwrap(), Some(entry()));

        state.remove().await.unwrap();
        assert!(!state.path().exists());
        state.remove().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_state_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.json");
        std::fs::write(&path, b"{not json").unwrap();

        let result = StateFile::new(&path).load::<serde_json::Value>().await;
        assert!(matches!(result, Err(Error::State(_))));
    }

    #[test]
    fn test_warning_is_optional_on_disk() {
        let parsed: StateEntry<serde_json::Value> =
            serde_json::from_value(json!({"kind": "key", "id": "1", "record": {}})).unwrap();
        assert!(parsed.warning.is_none());
        assert!(parsed.phase.is_none());
        let written = serde_json::to_value(&parsed).unwrap();
        assert!(written.get("warning").is_none());
        assert!(written.get("phase").is_none());
    }

    #[test]
    fn test_phase_is_written_in_snake_case() {
        let written = serde_json::to_value(entry()).unwrap();
        assert_eq!(written["phase"], json!("partial_success_pending"));
    }
}
