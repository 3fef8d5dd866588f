//! Reasoning-oracle request, response, and error types.
//!
//! The oracle is the external judgment capability (a language-model backend).
//! These types are the whole of its contract with the scoring engine; which
//! provider sits behind it is decided before a request is ever built.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::step::StepId;

/// Everything an oracle needs to judge one step against one conversation.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub step_id: StepId,
    pub step_title: String,
    /// The step's instruction text.
    pub prompt: String,
    /// Rendered conversation transcript, shared across every step of a run.
    pub transcript: Arc<str>,
    /// The ceiling the oracle should score against.
    pub max_score: f64,
    /// Named oracle profile requested by the step, if any.
    pub profile: Option<String>,
    /// Deadline the backend should apply to its own transport.
    pub timeout: Duration,
}

/// A parsed judgment for one step.
///
/// `score` is on the step's own scale (0..=max_score) and is NOT yet
/// validated; the evaluator clamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleResponse {
    pub score: f64,
    pub passed: bool,
    pub rationale: String,
    #[serde(default)]
    pub improvements: Option<String>,
}

/// Why an oracle call produced no usable judgment.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OracleError {
    #[error("oracle timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Connection failure, non-success HTTP status, or similar.
    #[error("oracle transport error: {reason}")]
    Transport { reason: String },

    /// The oracle answered but the answer could not be parsed into a judgment.
    #[error("malformed oracle response: {reason}")]
    MalformedResponse { reason: String },
}

impl OracleError {
    /// Timeouts and transport failures may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport { .. })
    }

    pub fn timeout(after: Duration) -> Self {
        Self::Timeout {
            timeout_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
