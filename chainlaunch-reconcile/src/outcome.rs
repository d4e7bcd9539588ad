//! Results of create/update operations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Classified result of a create call, before any readiness polling.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The call succeeded and the body parsed into an entity.
    Success(T),
    /// The call failed but the remote side persisted the entity. `entity` is
    /// `None` when only the id was reported, and the caller should read it.
    PartialSuccess {
        id: String,
        entity: Option<T>,
        stage: String,
        warning: String,
    },
    /// Nothing was persisted remotely.
    HardFailure(Error),
}

impl<T> Outcome<T> {
    pub fn is_hard_failure(&self) -> bool {
        matches!(self, Outcome::HardFailure(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// Advisory attached to an operation that still produced a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        };
        write!(f, "{}: {}: {}", level, self.summary, self.detail)
    }
}

/// Lifecycle phase of a resource that exists remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Readiness confirmed, or the resource has no readiness check.
    Ready,
    /// Created, readiness not (yet) confirmed.
    Pending,
    /// Persisted remotely despite a failed downstream step.
    PartialSuccessPending,
    /// The status endpoint reported a failure state.
    Failed,
}

/// A record that must be persisted, plus whatever went wrong on the way.
#[derive(Debug, Clone)]
pub struct Applied<R> {
    pub record: R,
    pub phase: Phase,
    pub diagnostics: Vec<Diagnostic>,
}

impl<R> Applied<R> {
    pub fn new(record: R, phase: Phase) -> Self {
        Self {
            record,
            phase,
            diagnostics: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}
