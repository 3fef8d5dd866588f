//! # threadaudit-contracts
//!
//! Shared types, schemas, and contracts for the threadaudit scoring engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate beyond conversation validation and transcript rendering.

pub mod conversation;
pub mod error;
pub mod ledger;
pub mod oracle;
pub mod result;
pub mod settings;
pub mod step;

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use conversation::{AttachmentMeta, Conversation, Message};
    use error::{ConfigErrorKind, ThreadAuditError};
    use oracle::OracleError;
    use result::{AuditRunId, StepResult};
    use settings::{AuditSettings, EvaluationSettings, ScoreScale};
    use step::StepId;

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn message(sender: &str, hour: u32, body: &str) -> Message {
        Message {
            sender: sender.to_string(),
            recipients: vec!["desk@travel.example".to_string()],
            cc: vec![],
            subject: "Trip to Lisbon".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap(),
            body: body.to_string(),
            quoted: None,
            attachments: vec![],
        }
    }

    fn conversation(messages: Vec<Message>) -> Conversation {
        Conversation {
            conversation_id: Some("thread-7".to_string()),
            transaction_id: None,
            messages,
        }
    }

    // ── Conversation ─────────────────────────────────────────────────────────

    #[test]
    fn test_conversation_without_messages_is_input_error() {
        let err = conversation(vec![]).validate().unwrap_err();
        match err {
            ThreadAuditError::Input { reason } => {
                assert!(reason.contains("thread-7"), "reason should name the thread: {reason}");
            }
            other => panic!("expected Input, got {:?}", other),
        }
    }

    #[test]
    fn test_conversation_blank_sender_is_input_error() {
        let conv = conversation(vec![message("  ", 9, "hello")]);
        assert!(matches!(conv.validate(), Err(ThreadAuditError::Input { .. })));
    }

    #[test]
    fn test_conversation_all_empty_bodies_is_input_error() {
        let conv = conversation(vec![message("a@x", 9, " "), message("b@x", 10, "")]);
        assert!(matches!(conv.validate(), Err(ThreadAuditError::Input { .. })));
    }

    #[test]
    fn test_transcript_is_chronological() {
        // Deliberately stored newest first.
        let conv = conversation(vec![
            message("agent@travel.example", 11, "Here are your options."),
            message("customer@mail.example", 9, "I need a flight."),
        ]);
        conv.validate().unwrap();

        let transcript = conv.transcript();
        let first = transcript.find("I need a flight.").unwrap();
        let second = transcript.find("Here are your options.").unwrap();
        assert!(first < second, "oldest message must render first:\n{transcript}");
        assert!(transcript.contains("--- Message 1 of 2 ---"));
        assert!(transcript.contains("From: customer@mail.example"));
    }

    #[test]
    fn test_transcript_renders_attachments_and_quotes() {
        let mut m = message("agent@travel.example", 9, "See attached itinerary.");
        m.attachments.push(AttachmentMeta {
            filename: "itinerary.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            size_bytes: Some(1024),
        });
        m.quoted = Some("Original request\nsecond line".to_string());
        m.cc = vec!["lead@travel.example".to_string()];

        let transcript = conversation(vec![m]).transcript();
        assert!(transcript.contains("Attachments: itinerary.pdf (application/pdf)"));
        assert!(transcript.contains("> Original request"));
        assert!(transcript.contains("> second line"));
        assert!(transcript.contains("Cc: lead@travel.example"));
    }

    #[test]
    fn test_participants_are_sorted_and_unique() {
        let conv = conversation(vec![
            message("b@x", 9, "one"),
            message("a@x", 10, "two"),
            message("b@x", 11, "three"),
        ]);
        assert_eq!(
            conv.participants(),
            vec!["a@x".to_string(), "b@x".to_string(), "desk@travel.example".to_string()]
        );
    }

    #[test]
    fn test_conversation_deserializes_with_optional_fields_absent() {
        let json = r#"{
            "messages": [{
                "sender": "customer@mail.example",
                "timestamp": "2026-03-02T09:00:00Z",
                "body": "Need a quote"
            }]
        }"#;
        let conv: Conversation = serde_json::from_str(json).unwrap();
        assert!(conv.conversation_id.is_none());
        assert!(conv.messages[0].recipients.is_empty());
        conv.validate().unwrap();
    }

    // ── StepResult ───────────────────────────────────────────────────────────

    #[test]
    fn test_errored_result_is_not_an_explicit_failure() {
        let r = StepResult::errored(
            StepId::new("accuracy"),
            OracleError::Timeout { timeout_ms: 500 },
            3,
        );
        assert_eq!(r.raw_score, 0.0);
        assert!(!r.passed);
        assert!(!r.is_explicit_failure());
        assert!(r.analysis.contains("3 attempt(s)"), "analysis: {}", r.analysis);
        assert!(r.analysis.contains("timed out"), "analysis: {}", r.analysis);
    }

    #[test]
    fn test_oracle_error_retryability() {
        assert!(OracleError::Timeout { timeout_ms: 1 }.is_retryable());
        assert!(OracleError::Transport { reason: "reset".into() }.is_retryable());
        assert!(!OracleError::MalformedResponse { reason: "no json".into() }.is_retryable());
    }

    #[test]
    fn test_oracle_error_serializes_with_kind_tag() {
        let json = serde_json::to_value(OracleError::Transport { reason: "503".into() }).unwrap();
        assert_eq!(json["kind"], "transport");
        assert_eq!(json["reason"], "503");
    }

    #[test]
    fn test_audit_run_id_new_produces_unique_values() {
        let ids: std::collections::HashSet<String> =
            (0..50).map(|_| AuditRunId::new().0.to_string()).collect();
        assert_eq!(ids.len(), 50);
    }

    // ── Settings ─────────────────────────────────────────────────────────────

    #[test]
    fn test_default_settings_are_valid() {
        assert!(AuditSettings::default().violations().is_empty());
        assert_eq!(AuditSettings::default().scoring.scale, ScoreScale::Unit);
    }

    #[test]
    fn test_settings_violations_report_every_field() {
        let mut s = AuditSettings::default();
        s.scoring.pass_threshold = 1.5;
        s.evaluation.concurrency = 0;
        s.evaluation.step_timeout_secs = 0;

        let fields: Vec<String> = s.violations().into_iter().map(|v| v.subject).collect();
        assert_eq!(fields.len(), 3, "got {fields:?}");
        assert!(fields.iter().any(|f| f.ends_with("pass_threshold")));
        assert!(fields.iter().any(|f| f.ends_with("concurrency")));
        assert!(fields.iter().any(|f| f.ends_with("step_timeout_secs")));
    }

    #[test]
    fn test_backoff_doubles_per_retry() {
        let s = EvaluationSettings {
            retry_backoff_ms: 100,
            ..Default::default()
        };
        assert_eq!(s.backoff_for(1).as_millis(), 100);
        assert_eq!(s.backoff_for(2).as_millis(), 200);
        assert_eq!(s.backoff_for(3).as_millis(), 400);
    }

    // ── ThreadAuditError display messages ────────────────────────────────────

    #[test]
    fn test_error_config_lists_every_violation() {
        let err = ThreadAuditError::Config {
            violations: vec![
                error::ConfigViolation::new(ConfigErrorKind::DuplicateId, "step 'a'", "declared twice"),
                error::ConfigViolation::new(
                    ConfigErrorKind::UnknownCategory,
                    "step 'b'",
                    "category 'x' is not declared",
                ),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 violation(s)"), "{msg}");
        assert!(msg.contains("[DuplicateId] step 'a'"), "{msg}");
        assert!(msg.contains("[UnknownCategory] step 'b'"), "{msg}");
        assert!(err.has_config_kind(ConfigErrorKind::DuplicateId));
        assert!(!err.has_config_kind(ConfigErrorKind::EmptyCategory));
    }

    #[test]
    fn test_error_aggregation_display() {
        let err = ThreadAuditError::Aggregation {
            reason: "result for unknown step 'ghost'".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("aggregation error"));
        assert!(msg.contains("ghost"));
        assert!(err.config_kinds().is_empty());
    }

    #[test]
    fn test_error_conversation_timeout_display() {
        let err = ThreadAuditError::ConversationTimeout { timeout_secs: 30 };
        assert!(err.to_string().contains("30s"));
    }
}
