//! Readiness polling.
//!
//! After a create, some resources (nodes, managed Vault providers, plugin
//! deployments) start asynchronously. [`Poller::wait`] queries a status
//! source until it reports a terminal value, the attempt budget runs out, or
//! the caller cancels.
//!
//! Running out of attempts is not an error: the resource most likely exists
//! and is slow to start, so the caller gets [`PollOutcome::TimedOut`] and
//! decides how to surface it.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::cancel::CancelSignal;
use crate::error::{Error, Result};

/// Attempt budget for one wait loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl PollConfig {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Worst-case time spent sleeping when no terminal state shows up.
    pub fn ceiling(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(60, Duration::from_secs(2))
    }
}

/// Status values that end a wait loop. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalStates {
    success: Vec<String>,
    failure: Vec<String>,
}

impl TerminalStates {
    pub fn new(success: &[&str], failure: &[&str]) -> Self {
        Self {
            success: success.iter().map(|s| s.to_string()).collect(),
            failure: failure.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// `Some(true)` for success, `Some(false)` for failure, `None` otherwise.
    pub fn classify(&self, status: &str) -> Option<bool> {
        let status = status.trim();
        if self.success.iter().any(|s| s.eq_ignore_ascii_case(status)) {
            Some(true)
        } else if self.failure.iter().any(|s| s.eq_ignore_ascii_case(status)) {
            Some(false)
        } else {
            None
        }
    }
}

/// Where the poller reads the current status from.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, id: &str) -> Result<String>;
}

/// How a wait loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Ready { attempts: u32, status: String },
    Failed { attempts: u32, status: String },
    TimedOut {
        attempts: u32,
        last_status: Option<String>,
    },
}

/// Per-loop counters, dropped when `wait` returns.
struct PollState {
    attempt: u32,
    max_attempts: u32,
    delay: Duration,
}

impl PollState {
    fn new(config: &PollConfig) -> Self {
        Self {
            attempt: 0,
            max_attempts: config.max_attempts,
            delay: config.delay,
        }
    }

    fn exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// Waits for a resource to reach a terminal status.
#[derive(Debug, Clone)]
pub struct Poller {
    config: PollConfig,
    terminal: TerminalStates,
}

impl Poller {
    pub fn new(config: PollConfig, terminal: TerminalStates) -> Self {
        Self { config, terminal }
    }

    /// Poll `source` for `id` until a terminal status, exhaustion, or
    /// cancellation. Cancellation is checked before every fetch and every
    /// sleep, and interrupts an in-flight sleep or fetch.
    pub async fn wait<S>(&self, source: &S, id: &str, cancel: &CancelSignal) -> Result<PollOutcome>
    where
        S: StatusSource + ?Sized,
    {
        let mut state = PollState::new(&self.config);
        let mut last_status = None;

        while !state.exhausted() {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            state.attempt += 1;

            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                status = source.fetch_status(id) => status?,
            };
            debug!(
                id,
                attempt = state.attempt,
                max_attempts = state.max_attempts,
                status = %status,
                "Polled status"
            );

            match self.terminal.classify(&status) {
                Some(true) => {
                    info!(id, attempts = state.attempt, status = %status, "Resource is ready");
                    return Ok(PollOutcome::Ready {
                        attempts: state.attempt,
                        status,
                    });
                }
                Some(false) => {
                    warn!(id, attempts = state.attempt, status = %status, "Resource reached failure state");
                    return Ok(PollOutcome::Failed {
                        attempts: state.attempt,
                        status,
                    });
                }
                None => last_status = Some(status),
            }

            if state.exhausted() {
                break;
            }
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(state.delay) => {}
            }
        }

        warn!(
            id,
            attempts = state.attempt,
            last_status = ?last_status,
            "Gave up waiting for resource"
        );
        Ok(PollOutcome::TimedOut {
            attempts: state.attempt,
            last_status,
        })
    }
}
