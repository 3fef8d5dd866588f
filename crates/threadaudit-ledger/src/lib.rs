//! # threadaudit-ledger
//!
//! Append-only, SHA-256 hash-chained processing ledger.
//!
//! ## Overview
//!
//! Every audited conversation is recorded as a `CaseRecord` wrapped in a
//! `LedgerEntry` that links to the previous entry via its SHA-256 hash.
//! The orchestrator consults the ledger before auditing so that re-running
//! a batch skips threads already scored. Tampering with any stored entry
//! breaks the chain and is detected by `verify_chain`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use threadaudit_ledger::InMemoryLedger;
//!
//! let ledger = InMemoryLedger::load_from("ledger.json")?;
//! let outcomes = orchestrator.run_batch(conversations, catalog, Some(Arc::new(ledger))).await;
//! ```

pub mod chain;
pub mod entry;
pub mod memory;

pub use chain::{fingerprint, hash_entry, verify_chain};
pub use entry::{LedgerEntry, LedgerSnapshot};
pub use memory::InMemoryLedger;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use threadaudit_contracts::{
        conversation::{Conversation, Message},
        result::{AuditResult, AuditRunId},
        settings::ScoreScale,
    };
    use threadaudit_core::RunLedger;

    use super::{fingerprint, verify_chain, InMemoryLedger, LedgerEntry};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn conversation(id: Option<&str>, body: &str) -> Conversation {
        Conversation {
            conversation_id: id.map(str::to_string),
            transaction_id: None,
            messages: vec![Message {
                sender: "customer@mail.example".into(),
                recipients: vec!["support@travel.example".into()],
                cc: vec![],
                subject: "Booking".into(),
                timestamp: Utc.with_ymd_and_hms(2026, 3, 2, 9, 15, 0).unwrap(),
                body: body.into(),
                quoted: None,
                attachments: vec![],
            }],
        }
    }

    fn result(final_score: f64, fatal: bool) -> AuditResult {
        AuditResult {
            run_id: AuditRunId::new(),
            per_step_results: vec![],
            category_subtotals: vec![],
            quality_score: final_score,
            score_without_fatal: final_score,
            fatal_transaction: fatal,
            final_score,
            scale: ScoreScale::Unit,
            timestamp: Utc::now(),
        }
    }

    fn filled(count: usize) -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        for i in 0..count {
            let conv = conversation(Some(&format!("thread-{i}")), &format!("message {i}"));
            ledger.record(&conv, &result(0.5, false)).unwrap();
        }
        ledger
    }

    // ── Chain ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_hash_chain_integrity() {
        let ledger = filled(3);
        assert!(ledger.verify_integrity(), "chain must be valid after sequential records");
    }

    #[test]
    fn test_tamper_detection() {
        let ledger = filled(3);
        {
            let mut state = ledger.state.lock().unwrap();
            state.entries[0].record.final_score = 1.0;
        }
        assert!(
            !ledger.verify_integrity(),
            "chain must detect tampering with a stored entry"
        );
    }

    #[test]
    fn test_genesis_and_sequence() {
        let snapshot = filled(3).export();
        assert_eq!(snapshot.entries[0].prev_hash, LedgerEntry::GENESIS_HASH);
        for (idx, entry) in snapshot.entries.iter().enumerate() {
            assert_eq!(entry.sequence, idx as u64, "sequence at position {idx}");
        }
        assert_eq!(snapshot.terminal_hash, snapshot.entries[2].this_hash);
    }

    #[test]
    fn test_reordered_entries_fail_verification() {
        let mut entries = filled(2).export().entries;
        entries.swap(0, 1);
        assert!(!verify_chain(&entries));
    }

    #[test]
    fn test_verify_empty() {
        assert!(InMemoryLedger::new().verify_integrity());
        assert!(verify_chain(&[]));
        assert_eq!(InMemoryLedger::new().export().terminal_hash, "");
    }

    // ── Records ───────────────────────────────────────────────────────────────

    #[test]
    fn test_case_number_format() {
        let ledger = InMemoryLedger::new();
        let case = ledger
            .record(&conversation(Some("a"), "hello"), &result(0.9, false))
            .unwrap();

        assert!(case.starts_with("CASE_"), "{case}");
        assert!(case.ends_with("_0001"), "{case}");
        // CASE_ + yyyymmdd_HHMMSS + _0001
        assert_eq!(case.len(), "CASE_".len() + 15 + 5, "{case}");
    }

    #[test]
    fn test_record_captures_result_fields() {
        let ledger = InMemoryLedger::new();
        let conv = conversation(Some("thread-9"), "refund please");
        let res = result(0.0, true);
        ledger.record(&conv, &res).unwrap();

        let entry = &ledger.export().entries[0];
        assert_eq!(entry.record.conversation_id.as_deref(), Some("thread-9"));
        assert_eq!(entry.record.fingerprint, fingerprint(&conv));
        assert_eq!(entry.record.fingerprint.len(), 64);
        assert_eq!(entry.record.run_id, res.run_id);
        assert!(entry.record.fatal_transaction);
    }

    #[test]
    fn test_lookup_by_id_or_fingerprint() {
        let ledger = InMemoryLedger::new();
        let case = ledger
            .record(&conversation(Some("thread-1"), "first body"), &result(0.8, false))
            .unwrap();

        assert_eq!(
            ledger.lookup(&conversation(Some("thread-1"), "edited body")),
            Some(case.clone()),
            "same id matches even if content changed"
        );
        assert_eq!(
            ledger.lookup(&conversation(None, "first body")),
            Some(case),
            "same content matches without an id"
        );
        assert_eq!(ledger.lookup(&conversation(Some("thread-2"), "other")), None);
        assert_eq!(ledger.lookup(&conversation(None, "other")), None);
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    #[test]
    fn test_save_and_load_preserves_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let ledger = filled(2);
        ledger.save_to(&path).unwrap();

        let loaded = InMemoryLedger::load_from(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.verify_integrity());
        assert!(loaded
            .lookup(&conversation(Some("thread-1"), "message 1"))
            .is_some());

        // Appending after a reload continues the same chain.
        loaded
            .record(&conversation(Some("thread-2"), "message 2"), &result(0.4, false))
            .unwrap();
        let snapshot = loaded.export();
        assert_eq!(snapshot.entries[2].sequence, 2);
        assert_eq!(snapshot.entries[2].prev_hash, snapshot.entries[1].this_hash);
        assert!(verify_chain(&snapshot.entries));
    }

    #[test]
    fn test_load_tampered_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        filled(2).save_to(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut json: serde_json::Value = serde_json::from_str(&text).unwrap();
        json["entries"][1]["record"]["final_score"] = serde_json::json!(1.0);
        std::fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

        let err = InMemoryLedger::load_from(&path).err().expect("tampered ledger must not load");
        assert!(err.to_string().contains("verification"), "{err}");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = InMemoryLedger::load_from(dir.path().join("absent.json"))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            threadaudit_contracts::error::ThreadAuditError::Io { .. }
        ));
    }
}
