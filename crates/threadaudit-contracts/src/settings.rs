//! Tunable scoring and evaluation settings.
//!
//! Loaded from the `[settings]` table of a catalog file. Every field has a
//! default so an absent table yields a working configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigErrorKind, ConfigViolation};

/// The scale the quality score is expressed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreScale {
    /// 0.0 to 1.0
    #[default]
    Unit,
    /// 0.0 to 100.0
    Percent,
}

impl ScoreScale {
    /// Multiplier applied to a normalized 0-1 ratio.
    pub fn factor(self) -> f64 {
        match self {
            Self::Unit => 1.0,
            Self::Percent => 100.0,
        }
    }
}

/// How step outcomes turn into pass/fail and how scores are expressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringSettings {
    /// Minimum `raw_score / max_score` for a step to count as passed.
    pub pass_threshold: f64,
    pub scale: ScoreScale,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            pass_threshold: 0.7,
            scale: ScoreScale::Unit,
        }
    }
}

/// Limits for the oracle fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluationSettings {
    /// Deadline for a single oracle call.
    pub step_timeout_secs: u64,
    /// Deadline for every step of one conversation together.
    pub conversation_timeout_secs: u64,
    /// Extra attempts after a timeout or transport failure.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each subsequent retry.
    pub retry_backoff_ms: u64,
    /// Oracle calls in flight per conversation. `1` is strictly sequential.
    pub concurrency: usize,
    /// Conversations audited at once by a batch run.
    pub parallel_conversations: usize,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            step_timeout_secs: 60,
            conversation_timeout_secs: 600,
            max_retries: 2,
            retry_backoff_ms: 500,
            concurrency: 4,
            parallel_conversations: 1,
        }
    }
}

impl EvaluationSettings {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }

    pub fn conversation_timeout(&self) -> Duration {
        Duration::from_secs(self.conversation_timeout_secs)
    }

    /// Backoff before retry number `retry` (1-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(1u64 << shift))
    }
}

/// The complete `[settings]` table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditSettings {
    pub scoring: ScoringSettings,
    pub evaluation: EvaluationSettings,
}

impl AuditSettings {
    /// Return every out-of-range value. Empty when the settings are usable.
    pub fn violations(&self) -> Vec<ConfigViolation> {
        let mut out = Vec::new();
        let threshold = self.scoring.pass_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            out.push(ConfigViolation::new(
                ConfigErrorKind::InvalidSetting,
                "settings.scoring.pass_threshold",
                format!("must be within 0.0..=1.0, got {threshold}"),
            ));
        }

        let eval = &self.evaluation;
        let positive = [
            ("step_timeout_secs", eval.step_timeout_secs),
            ("conversation_timeout_secs", eval.conversation_timeout_secs),
            ("concurrency", eval.concurrency as u64),
            ("parallel_conversations", eval.parallel_conversations as u64),
        ];
        for (name, value) in positive {
            if value == 0 {
                out.push(ConfigViolation::new(
                    ConfigErrorKind::InvalidSetting,
                    format!("settings.evaluation.{name}"),
                    "must be greater than zero",
                ));
            }
        }
        out
    }
}
