//! Ledger entry and snapshot types.
//!
//! `LedgerEntry` wraps a `CaseRecord` with its position in the chain and
//! the SHA-256 hashes that make tampering detectable. `LedgerSnapshot` is
//! the exported (and persisted) form of the whole ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use threadaudit_contracts::ledger::CaseRecord;

/// A single entry in the ledger's hash chain.
///
/// Modifying any field of the embedded `record` invalidates `this_hash`
/// and every later `prev_hash`, which `verify_chain` detects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Position in the chain, starting at 0.
    pub sequence: u64,

    pub record: CaseRecord,

    /// SHA-256 hash (hex) of the previous entry, or `GENESIS_HASH` for the
    /// first entry.
    pub prev_hash: String,

    /// SHA-256 hash (hex) over (sequence, prev_hash, canonical JSON of record).
    pub this_hash: String,
}

impl LedgerEntry {
    /// The `prev_hash` of the first entry in every ledger: 64 hex zeros.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// Point-in-time export of a ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub entries: Vec<LedgerEntry>,

    pub exported_at: DateTime<Utc>,

    /// The `this_hash` of the last entry. Empty string if the ledger is empty.
    pub terminal_hash: String,
}
