//! Core trait definitions for the threadaudit pipeline.
//!
//! Two seams separate the deterministic core from the outside world:
//!
//! - `ReasoningOracle`: untrusted judgment (a language-model backend)
//! - `RunLedger`:       trusted sink recording which conversations were audited
//!
//! The orchestrator never branches on which implementation sits behind
//! either trait; provider choice is resolved before construction.

use async_trait::async_trait;

use threadaudit_contracts::{
    conversation::Conversation,
    error::ThreadAuditResult,
    oracle::{OracleError, OracleRequest, OracleResponse},
    result::AuditResult,
};

/// The external judgment capability.
///
/// Implementations are **untrusted**: their score may be out of range and
/// their answers may be late or malformed. The evaluator clamps, times out,
/// and retries around them.
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    /// Judge one step against one conversation transcript.
    ///
    /// Implementations should honour `request.timeout` on their own transport;
    /// the evaluator enforces it independently as well.
    async fn judge(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError>;

    /// Short backend name for logs, e.g. `"openai"`.
    fn provider_name(&self) -> &'static str;
}

/// Persistent record of audited conversations.
///
/// Used by batch runs to skip conversations that were already processed
/// and to assign each audited conversation a case number.
pub trait RunLedger: Send + Sync {
    /// Case number of a previous audit of this conversation, if any.
    fn lookup(&self, conversation: &Conversation) -> Option<String>;

    /// Record a completed audit and return its new case number.
    ///
    /// Returns `ThreadAuditError::LedgerWriteFailed` if the record cannot
    /// be appended.
    fn record(&self, conversation: &Conversation, result: &AuditResult) -> ThreadAuditResult<String>;
}
