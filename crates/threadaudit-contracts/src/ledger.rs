//! Processing ledger records.
//!
//! A `CaseRecord` is what gets written to the ledger once per audited
//! conversation, so re-running a batch can skip threads already scored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::AuditRunId;

/// An immutable record of one completed conversation audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Ledger-assigned case number, e.g. `CASE_20261017_091500_0003`.
    pub case_number: String,
    pub conversation_id: Option<String>,
    /// Content fingerprint of the conversation transcript (hex).
    pub fingerprint: String,
    pub run_id: AuditRunId,
    pub final_score: f64,
    pub fatal_transaction: bool,
    pub recorded_at: DateTime<Utc>,
}
