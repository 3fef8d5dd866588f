//! Scenario 2: Fatal Override
//!
//! The agent books a Dubai connection for a Philippine passport holder and
//! never mentions transit rules. Transit visa advisory is a fatal step, so
//! its explicit failure zeroes the final score while the score without
//! fatal stays visible.

use std::sync::Arc;

use threadaudit_contracts::{error::ThreadAuditResult, result::AuditResult};
use threadaudit_core::AuditOrchestrator;
use threadaudit_report::ReportMeta;

use crate::{
    mock_data::dubai_connection_no_visa_advice,
    scenarios::print_report,
    scripted::{Scripted, ScriptedOracle},
    travel_catalog,
};

pub fn oracle() -> ScriptedOracle {
    ScriptedOracle::new()
        .reply(
            "transit_visa_advisory",
            Scripted::fail(
                0.0,
                "No transit guidance given for a Philippine passport holder connecting in Dubai.",
                "Check UAE transit rules for the passenger's nationality and state them in the quote.",
            ),
        )
        .reply(
            "cross_sell",
            Scripted::fail(
                0.0,
                "Air-only request; no hotel, car, or insurance offered.",
                "Offer an airport hotel or travel insurance on air-only bookings.",
            ),
        )
}

/// Run Scenario 2: Fatal Override.
pub async fn run_scenario() -> ThreadAuditResult<AuditResult> {
    println!("=== Scenario 2: Fatal Override ===");
    println!();

    let catalog = travel_catalog()?;
    let orchestrator = AuditOrchestrator::new(Arc::new(oracle()));
    let conversation = dubai_connection_no_visa_advice();

    println!("  Thread: {}", conversation.label());
    println!("  Fatal steps: limo_offering, transit_visa_advisory, accuracy");
    println!();

    let result = orchestrator.run(&conversation, &catalog).await?;

    println!("  Quality score:        {:.2}", result.quality_score);
    println!("  Score without fatal:  {:.2}", result.score_without_fatal);
    println!("  Fatal transaction:    {}", result.fatal_transaction);
    println!("  Final score:          {:.2}", result.final_score);
    println!();

    print_report(
        &catalog,
        &ReportMeta::from_conversation(&conversation, None),
        &result,
    )?;

    println!("  Scenario 2 complete.");
    println!();

    Ok(result)
}
