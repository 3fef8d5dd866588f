//! The step evaluator: one step, one conversation, one `StepResult`.
//!
//! Pipeline per step:
//!
//!   Request → [Oracle::judge under timeout] → retry? → Normalize → StepResult
//!
//! Oracle failures never escape this module. Timeouts and transport errors
//! are retried up to `max_retries` times with exponential backoff; anything
//! still failing, and every malformed response, becomes an errored
//! `StepResult` with `raw_score = 0`.

use std::sync::Arc;

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use threadaudit_contracts::{
    conversation::Conversation,
    oracle::{OracleError, OracleRequest, OracleResponse},
    result::StepResult,
    settings::{EvaluationSettings, ScoringSettings},
    step::StepDefinition,
};

use crate::traits::ReasoningOracle;

/// Prefix for every note the evaluator appends to `analysis`.
pub const NORMALIZATION_TAG: &str = "[normalization]";

/// Evaluates single steps against a shared oracle.
///
/// Cheap to clone; one instance is shared by every task of a run.
#[derive(Clone)]
pub struct StepEvaluator {
    oracle: Arc<dyn ReasoningOracle>,
    scoring: ScoringSettings,
    evaluation: EvaluationSettings,
}

impl StepEvaluator {
    pub fn new(
        oracle: Arc<dyn ReasoningOracle>,
        scoring: ScoringSettings,
        evaluation: EvaluationSettings,
    ) -> Self {
        Self {
            oracle,
            scoring,
            evaluation,
        }
    }

    /// Evaluate `step` against `conversation`.
    pub async fn evaluate(&self, step: &StepDefinition, conversation: &Conversation) -> StepResult {
        let transcript: Arc<str> = Arc::from(conversation.transcript());
        self.evaluate_transcript(step, transcript).await
    }

    /// Evaluate `step` against an already rendered transcript.
    pub async fn evaluate_transcript(&self, step: &StepDefinition, transcript: Arc<str>) -> StepResult {
        let step_timeout = self.evaluation.step_timeout();
        let request = OracleRequest {
            step_id: step.id.clone(),
            step_title: step.title.clone(),
            prompt: step.prompt.clone(),
            transcript,
            max_score: step.max_score,
            profile: step.profile.clone(),
            timeout: step_timeout,
        };
        let max_attempts = self.evaluation.max_retries.saturating_add(1);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(
                step_id = %step.id,
                attempt,
                provider = self.oracle.provider_name(),
                "judging step"
            );

            let outcome = match timeout(step_timeout, self.oracle.judge(&request)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(OracleError::timeout(step_timeout)),
            };

            match outcome {
                Ok(response) => return normalize(step, response, attempt, &self.scoring),

                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let backoff = self.evaluation.backoff_for(attempt);
                    warn!(
                        step_id = %step.id,
                        attempt,
                        error = %err,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        "oracle call failed; retrying"
                    );
                    sleep(backoff).await;
                }

                Err(err) => {
                    warn!(
                        step_id = %step.id,
                        attempts = attempt,
                        error = %err,
                        "step evaluation failed"
                    );
                    return StepResult::errored(step.id.clone(), err, attempt);
                }
            }
        }
    }
}

/// Turn an oracle judgment into a `StepResult` that honours the step's bounds.
///
/// - A non-finite score is treated as a malformed response.
/// - Scores outside `0..=max_score` are clamped and a note is appended.
/// - `passed` requires both the oracle's verdict and `raw / max >= pass_threshold`.
pub fn normalize(
    step: &StepDefinition,
    response: OracleResponse,
    attempts: u32,
    scoring: &ScoringSettings,
) -> StepResult {
    if !response.score.is_finite() {
        return StepResult::errored(
            step.id.clone(),
            OracleError::MalformedResponse {
                reason: format!("score is not finite: {}", response.score),
            },
            attempts,
        );
    }

    let mut notes = Vec::new();
    let raw_score = if response.score > step.max_score {
        notes.push(format!(
            "{NORMALIZATION_TAG} score {} exceeds max {}; clamped to {}",
            response.score, step.max_score, step.max_score
        ));
        step.max_score
    } else if response.score < 0.0 {
        notes.push(format!(
            "{NORMALIZATION_TAG} score {} is below 0; clamped to 0",
            response.score
        ));
        0.0
    } else {
        response.score
    };

    let ratio = raw_score / step.max_score;
    let meets_threshold = ratio >= scoring.pass_threshold;
    if response.passed && !meets_threshold {
        notes.push(format!(
            "{NORMALIZATION_TAG} oracle reported a pass but score ratio {ratio:.2} is below the pass threshold {:.2}; marked as failed",
            scoring.pass_threshold
        ));
    }
    if !notes.is_empty() {
        warn!(step_id = %step.id, notes = notes.len(), "judgment normalized");
    }

    let mut analysis = response.rationale;
    for note in notes {
        if !analysis.is_empty() {
            analysis.push('\n');
        }
        analysis.push_str(&note);
    }

    StepResult {
        step_id: step.id.clone(),
        raw_score,
        passed: response.passed && meets_threshold,
        analysis,
        improvements: response.improvements,
        evaluation_error: None,
        attempts,
    }
}
