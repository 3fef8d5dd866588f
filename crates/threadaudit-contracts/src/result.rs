//! Per-step and per-conversation audit outcomes.
//!
//! `StepResult` is produced once per (step, conversation) by the evaluator.
//! `AuditResult` is produced once per conversation by the scoring engine and
//! is what the report writer consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    oracle::OracleError,
    settings::ScoreScale,
    step::{CategoryId, StepId},
};

/// Unique identifier for one audit run over one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditRunId(pub uuid::Uuid);

impl AuditRunId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for AuditRunId {
    fn default() -> Self {
        Self::new()
    }
}

/// The outcome of evaluating one step against one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: StepId,
    /// Always within `0..=max_score` of the referenced step.
    pub raw_score: f64,
    pub passed: bool,
    /// Oracle rationale plus any normalization notes, or the failure explanation.
    pub analysis: String,
    #[serde(default)]
    pub improvements: Option<String>,
    /// Set when no judgment could be obtained. `raw_score` is then 0.
    #[serde(default)]
    pub evaluation_error: Option<OracleError>,
    /// Oracle calls made for this step, including retries.
    pub attempts: u32,
}

impl StepResult {
    /// A result recording that the oracle produced no usable judgment.
    pub fn errored(step_id: StepId, error: OracleError, attempts: u32) -> Self {
        let analysis = format!("evaluation failed after {attempts} attempt(s): {error}");
        Self {
            step_id,
            raw_score: 0.0,
            passed: false,
            analysis,
            improvements: None,
            evaluation_error: Some(error),
            attempts,
        }
    }

    /// True only for an explicit negative judgment. Evaluation errors are
    /// absence of evidence and never count.
    pub fn is_explicit_failure(&self) -> bool {
        !self.passed && self.evaluation_error.is_none()
    }
}

/// Summed raw scores for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySubtotal {
    pub category_id: CategoryId,
    pub title: String,
    /// Sum of member raw scores.
    pub subtotal: f64,
    /// Sum of member max scores.
    pub ceiling: f64,
}

impl CategorySubtotal {
    /// `subtotal / ceiling`, for percentage displays.
    pub fn ratio(&self) -> f64 {
        if self.ceiling > 0.0 {
            self.subtotal / self.ceiling
        } else {
            0.0
        }
    }
}

/// The aggregated outcome for one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub run_id: AuditRunId,
    /// One entry per catalog step, in catalog order.
    pub per_step_results: Vec<StepResult>,
    /// One entry per category, in schema order.
    pub category_subtotals: Vec<CategorySubtotal>,
    /// Weighted average before the fatal override, on `scale`.
    pub quality_score: f64,
    /// Always equal to `quality_score`; reported for transparency.
    pub score_without_fatal: f64,
    pub fatal_transaction: bool,
    /// `0` when `fatal_transaction`, otherwise `quality_score`.
    pub final_score: f64,
    pub scale: ScoreScale,
    pub timestamp: DateTime<Utc>,
}

impl AuditResult {
    pub fn step(&self, step_id: &str) -> Option<&StepResult> {
        self.per_step_results.iter().find(|r| r.step_id.0 == step_id)
    }

    pub fn subtotal(&self, category_id: &str) -> Option<&CategorySubtotal> {
        self.category_subtotals
            .iter()
            .find(|c| c.category_id.0 == category_id)
    }

    /// Steps whose evaluation produced an error rather than a judgment.
    pub fn errored_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.per_step_results
            .iter()
            .filter(|r| r.evaluation_error.is_some())
    }
}
