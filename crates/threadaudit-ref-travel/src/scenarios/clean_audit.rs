//! Scenario 1: Clean Audit
//!
//! A well-handled London to Sydney booking is audited end to end and
//! recorded in the processing ledger. Re-submitting the same thread shows
//! the ledger skipping work that was already done.
//!
//! Pipeline walk-through for the demo run:
//!   1. Catalog loads: seven steps in three categories
//!   2. Every step is judged; cross-sell scores 2.5 of 3.0
//!   3. Scores aggregate; no fatal step fails
//!   4. The ledger assigns a case number
//!   5. A second batch with the same thread is skipped
//!   6. Ledger chain integrity is verified

use std::sync::Arc;

use threadaudit_contracts::{
    error::{ThreadAuditError, ThreadAuditResult},
    result::AuditResult,
};
use threadaudit_core::{AuditOrchestrator, ConversationOutcome, RunLedger};
use threadaudit_ledger::InMemoryLedger;
use threadaudit_report::ReportMeta;

use crate::{
    mock_data::doha_connection_booking,
    scenarios::{audited, print_report},
    scripted::{Scripted, ScriptedOracle},
    travel_catalog,
};

pub fn oracle() -> ScriptedOracle {
    ScriptedOracle::new()
        .reply(
            "communication",
            Scripted::pass(3.0, "Clear, complete replies; case number quoted throughout."),
        )
        .reply(
            "transit_visa_advisory",
            Scripted::pass(5.4, "Airside transit in Doha explained for a UK passport holder."),
        )
        .reply(
            "cross_sell",
            Scripted::pass(2.5, "Hotel and insurance offered; car offered only as transfer."),
        )
}

/// Run Scenario 1: Clean Audit.
pub async fn run_scenario() -> ThreadAuditResult<AuditResult> {
    println!("=== Scenario 1: Clean Audit ===");
    println!();

    let catalog = travel_catalog()?;
    let oracle = Arc::new(oracle());
    let orchestrator = AuditOrchestrator::new(oracle.clone());
    let ledger = Arc::new(InMemoryLedger::new());
    let conversation = doha_connection_booking();

    println!(
        "  Catalog: {} step(s) in {} categor(ies)",
        catalog.steps().len(),
        catalog.schema().len()
    );
    println!("  Thread:  {}", conversation.label());
    println!();

    // ── First submission: audited and recorded ────────────────────────────────

    let mut outcomes = orchestrator
        .run_batch(
            vec![conversation.clone()],
            Arc::clone(&catalog),
            Some(ledger.clone() as Arc<dyn RunLedger>),
        )
        .await;
    let outcome = outcomes.pop().ok_or_else(|| ThreadAuditError::Internal {
        reason: "batch returned no outcome".into(),
    })?;
    let (case_number, result) = audited(outcome)?;

    println!("  Oracle calls:       {}", oracle.total_calls());
    println!("  Fatal transaction:  {}", result.fatal_transaction);
    println!("  Final score:        {:.2}", result.final_score);
    println!();

    print_report(
        &catalog,
        &ReportMeta::from_conversation(&conversation, case_number),
        &result,
    )?;

    // ── Second submission: skipped via the ledger ─────────────────────────────

    let rerun = orchestrator
        .run_batch(
            vec![conversation],
            Arc::clone(&catalog),
            Some(ledger.clone() as Arc<dyn RunLedger>),
        )
        .await;
    for outcome in &rerun {
        if let ConversationOutcome::Skipped { case_number, .. } = outcome {
            println!("  Re-submitted thread skipped: already audited as {case_number}");
        }
    }

    println!(
        "  Ledger chain integrity: {} ({} entr(ies))",
        if ledger.verify_integrity() { "VERIFIED" } else { "FAILED" },
        ledger.len()
    );
    println!();
    println!("  Scenario 1 complete.");
    println!();

    Ok(result)
}
