//! In-memory implementation of `RunLedger`.
//!
//! `InMemoryLedger` keeps every entry in a `Vec` behind a `Mutex`, so the
//! orchestrator can share it across concurrently audited conversations.
//! `save_to` / `load_from` persist the chain as JSON between runs; a file
//! whose chain does not verify is rejected on load.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, info};

use threadaudit_contracts::{
    conversation::Conversation,
    error::{ThreadAuditError, ThreadAuditResult},
    ledger::CaseRecord,
    result::AuditResult,
};
use threadaudit_core::RunLedger;

use crate::{
    chain::{fingerprint, hash_entry, verify_chain},
    entry::{LedgerEntry, LedgerSnapshot},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct LedgerState {
    pub(crate) entries: Vec<LedgerEntry>,

    /// The `this_hash` of the last entry, or `GENESIS_HASH` when empty.
    pub(crate) last_hash: String,
}

impl LedgerState {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            last_hash: LedgerEntry::GENESIS_HASH.to_string(),
        }
    }
}

// ── Public ledger ─────────────────────────────────────────────────────────────

/// An append-only processing ledger backed by a SHA-256 hash chain.
pub struct InMemoryLedger {
    pub(crate) state: Mutex<LedgerState>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::empty()),
        }
    }

    /// Rebuild a ledger from an exported snapshot.
    ///
    /// Returns `ThreadAuditError::Input` if the snapshot's chain does not
    /// verify.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> ThreadAuditResult<Self> {
        if !verify_chain(&snapshot.entries) {
            return Err(ThreadAuditError::Input {
                reason: "ledger snapshot failed hash-chain verification".into(),
            });
        }

        let last_hash = snapshot
            .entries
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_else(|| LedgerEntry::GENESIS_HASH.to_string());

        Ok(Self {
            state: Mutex::new(LedgerState {
                entries: snapshot.entries,
                last_hash,
            }),
        })
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("ledger state lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Export every entry recorded so far.
    pub fn export(&self) -> LedgerSnapshot {
        let state = self.state.lock().expect("ledger state lock poisoned");
        LedgerSnapshot {
            entries: state.entries.clone(),
            exported_at: Utc::now(),
            terminal_hash: state
                .entries
                .last()
                .map(|e| e.this_hash.clone())
                .unwrap_or_default(),
        }
    }

    pub fn verify_integrity(&self) -> bool {
        let state = self.state.lock().expect("ledger state lock poisoned");
        verify_chain(&state.entries)
    }

    /// Write the ledger to `path` as pretty-printed JSON.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ThreadAuditResult<()> {
        let path = path.as_ref();
        let snapshot = self.export();
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| {
            ThreadAuditError::LedgerWriteFailed {
                reason: format!("failed to serialize ledger: {e}"),
            }
        })?;
        std::fs::write(path, json).map_err(|e| ThreadAuditError::LedgerWriteFailed {
            reason: format!("failed to write '{}': {e}", path.display()),
        })?;

        info!(
            path = %path.display(),
            entries = snapshot.entries.len(),
            terminal_hash = %snapshot.terminal_hash,
            "ledger saved"
        );
        Ok(())
    }

    /// Load a ledger previously written by [`save_to`](Self::save_to).
    pub fn load_from(path: impl AsRef<Path>) -> ThreadAuditResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ThreadAuditError::Io {
            reason: format!("failed to read ledger '{}': {e}", path.display()),
        })?;
        let snapshot: LedgerSnapshot =
            serde_json::from_str(&text).map_err(|e| ThreadAuditError::Input {
                reason: format!("ledger '{}' is not valid JSON: {e}", path.display()),
            })?;

        let ledger = Self::from_snapshot(snapshot).map_err(|_| ThreadAuditError::Input {
            reason: format!("ledger '{}' failed hash-chain verification", path.display()),
        })?;
        debug!(path = %path.display(), entries = ledger.len(), "ledger loaded");
        Ok(ledger)
    }
}

fn case_number(recorded_at: chrono::DateTime<Utc>, sequence: u64) -> String {
    format!("CASE_{}_{:04}", recorded_at.format("%Y%m%d_%H%M%S"), sequence + 1)
}

// ── RunLedger impl ────────────────────────────────────────────────────────────

impl RunLedger for InMemoryLedger {
    /// A conversation matches an entry with the same transcript fingerprint,
    /// or with the same non-empty conversation id.
    fn lookup(&self, conversation: &Conversation) -> Option<String> {
        let print = fingerprint(conversation);
        let state = self.state.lock().expect("ledger state lock poisoned");
        state
            .entries
            .iter()
            .find(|entry| {
                entry.record.fingerprint == print
                    || matches!(
                        (&entry.record.conversation_id, &conversation.conversation_id),
                        (Some(recorded), Some(current)) if recorded == current
                    )
            })
            .map(|entry| entry.record.case_number.clone())
    }

    fn record(&self, conversation: &Conversation, result: &AuditResult) -> ThreadAuditResult<String> {
        let mut state = self.state.lock().map_err(|e| ThreadAuditError::LedgerWriteFailed {
            reason: format!("ledger state lock poisoned: {e}"),
        })?;

        let sequence = state.entries.len() as u64;
        let recorded_at = Utc::now();
        let record = CaseRecord {
            case_number: case_number(recorded_at, sequence),
            conversation_id: conversation.conversation_id.clone(),
            fingerprint: fingerprint(conversation),
            run_id: result.run_id.clone(),
            final_score: result.final_score,
            fatal_transaction: result.fatal_transaction,
            recorded_at,
        };

        let prev_hash = state.last_hash.clone();
        let this_hash = hash_entry(sequence, &record, &prev_hash);
        let case = record.case_number.clone();

        state.entries.push(LedgerEntry {
            sequence,
            record,
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.last_hash = this_hash;

        debug!(case_number = %case, sequence, "case recorded");
        Ok(case)
    }
}
