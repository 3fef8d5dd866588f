//! # threadaudit-ref-travel
//!
//! Travel-desk reference runtime for threadaudit.
//!
//! Demonstrates three audit scenarios against the bundled travel catalog:
//!
//! 1. **Clean Audit**: a well-handled booking, recorded in the ledger and
//!    skipped on re-submission.
//! 2. **Fatal Override**: a missed transit visa advisory zeroes the final
//!    score.
//! 3. **Oracle Outage**: timeouts, transport errors, and malformed replies
//!    degrade to per-step evaluation errors.
//!
//! All threads are fictional and the oracle is scripted. No network calls
//! are made.

pub mod mock_data;
pub mod scenarios;
pub mod scripted;

use std::sync::Arc;

use threadaudit_catalog::AuditCatalog;
use threadaudit_contracts::error::ThreadAuditResult;

/// The bundled travel-desk audit catalog.
pub const TRAVEL_CATALOG: &str = include_str!("../catalogs/travel.toml");

pub fn travel_catalog() -> ThreadAuditResult<Arc<AuditCatalog>> {
    AuditCatalog::from_toml_str(TRAVEL_CATALOG).map(Arc::new)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use threadaudit_contracts::settings::ScoreScale;
    use threadaudit_core::AuditOrchestrator;
    use threadaudit_report::ReportLayout;

    use crate::{mock_data, scenarios, travel_catalog};

    /// Sum of every max score in the travel catalog.
    const TOTAL: f64 = 28.2;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    // ── Catalog ───────────────────────────────────────────────────────────────

    #[test]
    fn test_travel_catalog_loads() {
        let catalog = travel_catalog().unwrap();
        assert_eq!(catalog.name(), Some("travel-desk"));
        assert_eq!(catalog.steps().len(), 7);
        assert_eq!(catalog.schema().len(), 3);
        assert!(close(catalog.steps().total_max_score(), TOTAL));
        assert_eq!(catalog.settings().scoring.scale, ScoreScale::Percent);

        let fatal: Vec<&str> = catalog
            .steps()
            .steps_in_order()
            .iter()
            .filter(|s| s.is_fatal)
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(fatal, vec!["limo_offering", "transit_visa_advisory", "accuracy"]);

        let profiles: Vec<String> = catalog.profiles().into_iter().collect();
        assert_eq!(profiles, vec!["detail", "primary", "reasoning"]);
    }

    #[test]
    fn test_travel_report_columns_group_by_category() {
        let layout = ReportLayout::for_catalog(&travel_catalog().unwrap()).unwrap();
        let headers = layout.headers();
        assert_eq!(headers[5], "Overall communication in the email");
        assert_eq!(headers[6], "Utilized cross sell & up sell opportunity (Hotel, Car, Insurance)");
        assert_eq!(headers[7], "Quotation based on request (Date, Time, City Pair)");
        assert_eq!(headers[8], "Logical Itinerary (Time window, Routing, Connections)");
        assert_eq!(headers.last().copied(), Some("FEEDBACK"));
    }

    #[test]
    fn test_mock_threads_are_valid() {
        for conversation in mock_data::all_conversations() {
            conversation.validate().unwrap();
            assert!(conversation.conversation_id.is_some());
        }
    }

    // ── Scenarios ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_clean_audit_scenario() {
        let result = scenarios::clean_audit::run_scenario().await.unwrap();

        assert!(!result.fatal_transaction);
        assert!(close(result.final_score, (TOTAL - 0.5) / TOTAL * 100.0));
        assert!(result.errored_steps().next().is_none());
    }

    #[tokio::test]
    async fn test_fatal_override_scenario() {
        let result = scenarios::fatal_override::run_scenario().await.unwrap();

        assert!(result.fatal_transaction);
        assert_eq!(result.final_score, 0.0);
        assert!(close(result.score_without_fatal, (TOTAL - 5.4 - 3.0) / TOTAL * 100.0));
        assert!(close(result.subtotal("policy_service").unwrap().subtotal, 3.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_oracle_outage_scenario() {
        let result = scenarios::oracle_outage::run_scenario().await.unwrap();

        assert!(!result.fatal_transaction, "errored fatal steps never zero the score");
        let errored: Vec<&str> = result.errored_steps().map(|s| s.step_id.as_str()).collect();
        assert_eq!(errored, vec!["transit_visa_advisory", "accuracy"]);
        assert_eq!(result.step("transit_visa_advisory").unwrap().attempts, 3);
        assert_eq!(result.step("accuracy").unwrap().attempts, 1);
        assert_eq!(result.step("case_reference").unwrap().attempts, 2);
        assert!(close(result.final_score, (TOTAL - 10.8) / TOTAL * 100.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_oracle_counts_retries() {
        let oracle = Arc::new(scenarios::oracle_outage::oracle());
        let catalog = travel_catalog().unwrap();
        AuditOrchestrator::new(oracle.clone())
            .run(&mock_data::hotel_only_request(), &catalog)
            .await
            .unwrap();

        assert_eq!(oracle.calls("transit_visa_advisory"), 3);
        assert_eq!(oracle.calls("case_reference"), 2);
        assert_eq!(oracle.calls("accuracy"), 1);
        assert_eq!(oracle.calls("communication"), 1);
        assert_eq!(oracle.total_calls(), 3 + 2 + 1 + 4);
    }
}
