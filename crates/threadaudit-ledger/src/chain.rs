//! Hash-chain primitives: hashing, fingerprinting, and chain verification.
//!
//! Hash input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   3. canonical JSON of the case record (serde_json, no pretty-printing)

use sha2::{Digest, Sha256};

use threadaudit_contracts::{conversation::Conversation, ledger::CaseRecord};

use crate::entry::LedgerEntry;

/// Compute the SHA-256 hash for a single ledger entry.
///
/// Returns a lowercase 64-character hex string.
///
/// # Panics
///
/// Panics if `record` cannot be serialized to JSON, which cannot happen
/// for `CaseRecord`.
pub fn hash_entry(sequence: u64, record: &CaseRecord, prev_hash: &str) -> String {
    let record_json =
        serde_json::to_vec(record).expect("CaseRecord must always be serializable to JSON");

    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    hex::encode(hasher.finalize())
}

/// SHA-256 hex of the conversation's rendered transcript.
///
/// Two conversations with the same messages fingerprint identically
/// regardless of their identifiers.
pub fn fingerprint(conversation: &Conversation) -> String {
    hex::encode(Sha256::digest(conversation.transcript().as_bytes()))
}

/// Verify the integrity of a hash chain.
///
/// Valid when, for every entry in order:
///
/// 1. `sequence` equals its position,
/// 2. `prev_hash` equals the previous entry's `this_hash` (or `GENESIS_HASH`),
/// 3. `this_hash` matches the value recomputed from the entry's fields.
///
/// An empty chain is valid.
pub fn verify_chain(entries: &[LedgerEntry]) -> bool {
    let mut expected_prev: &str = LedgerEntry::GENESIS_HASH;

    for (position, entry) in entries.iter().enumerate() {
        if entry.sequence != position as u64 || entry.prev_hash != expected_prev {
            return false;
        }
        if entry.this_hash != hash_entry(entry.sequence, &entry.record, &entry.prev_hash) {
            return false;
        }
        expected_prev = entry.this_hash.as_str();
    }

    true
}
