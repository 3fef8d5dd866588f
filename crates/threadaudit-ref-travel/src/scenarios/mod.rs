//! Travel-desk reference scenarios.
//!
//! Each scenario wires real threadaudit components (catalog, orchestrator,
//! scoring, ledger, report layout) to a `ScriptedOracle` and one mock
//! thread, prints the resulting report row, and returns the `AuditResult`.

pub mod clean_audit;
pub mod fatal_override;
pub mod oracle_outage;

use threadaudit_catalog::AuditCatalog;
use threadaudit_contracts::{
    error::{ThreadAuditError, ThreadAuditResult},
    result::AuditResult,
};
use threadaudit_core::ConversationOutcome;
use threadaudit_report::{ReportLayout, ReportMeta, ReportRow};

/// Print every report column of `result` as `header: cell`.
pub(crate) fn print_report(
    catalog: &AuditCatalog,
    meta: &ReportMeta,
    result: &AuditResult,
) -> ThreadAuditResult<()> {
    let layout = ReportLayout::for_catalog(catalog)?;
    let row = ReportRow::render(&layout, meta, result)?;

    println!("  Report (schema v{}):", layout.schema_version());
    for (header, cell) in layout.headers().iter().zip(&row.cells) {
        println!("    {header}: {cell}");
    }
    println!();
    Ok(())
}

/// Unwrap an `Audited` outcome; anything else becomes an error.
pub(crate) fn audited(
    outcome: ConversationOutcome,
) -> ThreadAuditResult<(Option<String>, AuditResult)> {
    match outcome {
        ConversationOutcome::Audited {
            case_number,
            result,
            ..
        } => Ok((case_number, result)),
        ConversationOutcome::Skipped { case_number, .. } => Err(ThreadAuditError::Internal {
            reason: format!("expected a fresh audit, ledger already holds {case_number}"),
        }),
        ConversationOutcome::Failed { error, .. } => Err(error),
    }
}
