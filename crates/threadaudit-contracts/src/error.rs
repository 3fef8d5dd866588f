//! Error types for the threadaudit pipeline.
//!
//! All fallible operations return `ThreadAuditResult<T>`. Oracle failures are
//! deliberately absent here: they live in [`crate::oracle::OracleError`] and
//! are recorded on the step result instead of propagating.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classifies a single configuration problem found while loading a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigErrorKind {
    /// A required text field (id, title, prompt, report column) is empty.
    MissingField,
    /// Two steps share an `id`.
    DuplicateId,
    /// Two output headers share the same text.
    DuplicateReportColumn,
    /// A step names a category that was never declared.
    UnknownCategory,
    /// `max_score` is not positive, `weight` is negative, or the catalog's
    /// total weight is zero.
    InvalidScoreBound,
    /// Two categories share an `id`.
    DuplicateCategoryId,
    /// A declared category has no member steps.
    EmptyCategory,
    /// A `[settings]` value is out of range or a runtime option is invalid.
    InvalidSetting,
    /// The configuration text could not be parsed.
    Parse,
    /// The configuration file could not be read.
    Io,
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MissingField => "MissingField",
            Self::DuplicateId => "DuplicateId",
            Self::DuplicateReportColumn => "DuplicateReportColumn",
            Self::UnknownCategory => "UnknownCategory",
            Self::InvalidScoreBound => "InvalidScoreBound",
            Self::DuplicateCategoryId => "DuplicateCategoryId",
            Self::EmptyCategory => "EmptyCategory",
            Self::InvalidSetting => "InvalidSetting",
            Self::Parse => "Parse",
            Self::Io => "Io",
        };
        f.write_str(name)
    }
}

/// One configuration problem, tied to the step, category, or setting it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigViolation {
    pub kind: ConfigErrorKind,
    /// What the violation is about, e.g. `step 'accuracy'` or `settings.scoring`.
    pub subject: String,
    pub message: String,
}

impl ConfigViolation {
    pub fn new(
        kind: ConfigErrorKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.message)
    }
}

fn describe_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The unified error type for threadaudit.
#[derive(Debug, Error)]
pub enum ThreadAuditError {
    /// The catalog, schema, or runtime configuration is malformed.
    ///
    /// Always carries every violation found in the load pass, never just the first.
    #[error("configuration error ({} violation(s)): {}", .violations.len(), describe_violations(.violations))]
    Config { violations: Vec<ConfigViolation> },

    /// The conversation is missing, unreadable, or structurally unusable.
    #[error("input error: {reason}")]
    Input { reason: String },

    /// The whole-conversation deadline elapsed before every step finished.
    /// No partial result is produced.
    #[error("conversation audit timed out after {timeout_secs}s")]
    ConversationTimeout { timeout_secs: u64 },

    /// Step results and catalog disagree. Indicates a programming or
    /// configuration bug; never retried.
    #[error("aggregation error: {reason}")]
    Aggregation { reason: String },

    #[error("step '{step_id}' not found in catalog")]
    StepNotFound { step_id: String },

    #[error("category '{category_id}' not found in schema")]
    CategoryNotFound { category_id: String },

    /// The processing ledger could not persist a record.
    #[error("ledger write failed: {reason}")]
    LedgerWriteFailed { reason: String },

    /// Reading or writing an input/output file failed.
    #[error("i/o error: {reason}")]
    Io { reason: String },

    /// A worker task ended without producing a value (panic or cancellation).
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl ThreadAuditError {
    /// Build a `Config` error holding a single violation.
    pub fn config(
        kind: ConfigErrorKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Config {
            violations: vec![ConfigViolation::new(kind, subject, message)],
        }
    }

    /// The violation kinds carried by a `Config` error; empty for other variants.
    pub fn config_kinds(&self) -> Vec<ConfigErrorKind> {
        match self {
            Self::Config { violations } => violations.iter().map(|v| v.kind).collect(),
            _ => Vec::new(),
        }
    }

    /// True if this is a `Config` error containing a violation of `kind`.
    pub fn has_config_kind(&self, kind: ConfigErrorKind) -> bool {
        self.config_kinds().contains(&kind)
    }
}

/// Convenience alias used throughout the threadaudit crates.
pub type ThreadAuditResult<T> = Result<T, ThreadAuditError>;
