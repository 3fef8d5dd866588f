//! Scenario 3: Oracle Outage
//!
//! The oracle misbehaves on three steps:
//!   - transit visa advisory times out on every attempt
//!   - case reference hits a transport error once, then answers
//!   - quotation accuracy returns an unparsable judgment
//!
//! Retryable failures are retried with backoff; the rest are recorded as
//! evaluation errors. Errored fatal steps never trigger the fatal override,
//! so the thread still gets a full report row with `ERROR` cells.

use std::sync::Arc;

use threadaudit_contracts::{error::ThreadAuditResult, result::AuditResult};
use threadaudit_core::AuditOrchestrator;
use threadaudit_report::ReportMeta;

use crate::{
    mock_data::hotel_only_request,
    scenarios::print_report,
    scripted::{Scripted, ScriptedOracle},
    travel_catalog,
};

pub fn oracle() -> ScriptedOracle {
    ScriptedOracle::new()
        .reply("transit_visa_advisory", Scripted::Timeout)
        .replies(
            "case_reference",
            vec![
                Scripted::Transport("HTTP 502 Bad Gateway".into()),
                Scripted::pass(3.0, "Case 55230 quoted in the reply subject."),
            ],
        )
        .reply(
            "accuracy",
            Scripted::Malformed("no JSON object found in model output".into()),
        )
}

/// Run Scenario 3: Oracle Outage.
pub async fn run_scenario() -> ThreadAuditResult<AuditResult> {
    println!("=== Scenario 3: Oracle Outage ===");
    println!();

    let catalog = travel_catalog()?;
    let oracle = Arc::new(oracle());
    let orchestrator = AuditOrchestrator::new(oracle.clone());
    let conversation = hotel_only_request();

    let result = orchestrator.run(&conversation, &catalog).await?;

    for step in ["transit_visa_advisory", "case_reference", "accuracy"] {
        println!("  {step:<22} oracle calls: {}", oracle.calls(step));
    }
    println!();
    for errored in result.errored_steps() {
        println!("  {}: {}", errored.step_id, errored.analysis);
    }
    println!();
    println!("  Fatal transaction:  {}", result.fatal_transaction);
    println!("  Final score:        {:.2}", result.final_score);
    println!();

    print_report(
        &catalog,
        &ReportMeta::from_conversation(&conversation, None),
        &result,
    )?;

    println!("  Scenario 3 complete.");
    println!();

    Ok(result)
}
