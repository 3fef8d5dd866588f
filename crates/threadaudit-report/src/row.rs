//! Rendering one `AuditResult` into the cells of a report row.

use chrono::{DateTime, Utc};

use threadaudit_contracts::{
    conversation::Conversation,
    error::{ThreadAuditError, ThreadAuditResult},
    result::AuditResult,
    settings::ScoreScale,
};

use crate::layout::{ColumnKind, ReportLayout};

const DATE_FORMAT: &str = "%d-%b-%y";

pub const ERROR_CELL: &str = "ERROR";
pub const FATAL_CELL: &str = "Fatal Error";
pub const NOT_FATAL_CELL: &str = "NO";
pub const CRITICAL_PREFIX: &str = "Critical: ";

/// Identifying fields that come from outside the `AuditResult`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportMeta {
    /// Ledger case number. The run id is used when there is none.
    pub case_number: Option<String>,
    pub conversation_id: Option<String>,
    pub transaction_id: Option<String>,
    /// Earliest message in the thread.
    pub transaction_date: Option<DateTime<Utc>>,
}

impl ReportMeta {
    pub fn from_conversation(conversation: &Conversation, case_number: Option<String>) -> Self {
        Self {
            case_number,
            conversation_id: conversation.conversation_id.clone(),
            transaction_id: conversation.transaction_id.clone(),
            transaction_date: conversation.first_timestamp(),
        }
    }
}

/// One rendered row; `cells[i]` belongs under `layout.headers()[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub cells: Vec<String>,
}

impl ReportRow {
    /// Fill every column of `layout` from `meta` and `result`.
    ///
    /// Fails with `StepNotFound` / `CategoryNotFound` if the result was
    /// produced by a different catalog than the layout.
    pub fn render(
        layout: &ReportLayout,
        meta: &ReportMeta,
        result: &AuditResult,
    ) -> ThreadAuditResult<Self> {
        let mut cells = Vec::with_capacity(layout.len());

        for column in layout.columns() {
            let cell = match &column.kind {
                ColumnKind::AuditId => meta
                    .case_number
                    .clone()
                    .unwrap_or_else(|| result.run_id.0.to_string()),
                ColumnKind::ConversationId => meta.conversation_id.clone().unwrap_or_default(),
                ColumnKind::TransactionId => meta.transaction_id.clone().unwrap_or_default(),
                ColumnKind::AuditDate => format_date(result.timestamp),
                ColumnKind::TransactionDate => {
                    meta.transaction_date.map(format_date).unwrap_or_default()
                }
                ColumnKind::Step(step_id) => {
                    let step = result.step(step_id.as_str()).ok_or_else(|| {
                        ThreadAuditError::StepNotFound {
                            step_id: step_id.to_string(),
                        }
                    })?;
                    if step.evaluation_error.is_some() {
                        ERROR_CELL.to_string()
                    } else {
                        format!("{:.2}", step.raw_score)
                    }
                }
                ColumnKind::MaxScore => format!("{:.2}", layout.max_score()),
                ColumnKind::QualityScore => format_score(result.quality_score, result.scale),
                ColumnKind::ScoreWithoutFatal => {
                    format_score(result.score_without_fatal, result.scale)
                }
                ColumnKind::FatalTransaction => {
                    let flag = if result.fatal_transaction {
                        FATAL_CELL
                    } else {
                        NOT_FATAL_CELL
                    };
                    flag.to_string()
                }
                ColumnKind::FinalScore => format_score(result.final_score, result.scale),
                ColumnKind::Category(category_id) => {
                    let subtotal = result.subtotal(category_id.as_str()).ok_or_else(|| {
                        ThreadAuditError::CategoryNotFound {
                            category_id: category_id.to_string(),
                        }
                    })?;
                    format!("{:.2}/{:.2}", subtotal.subtotal, subtotal.ceiling)
                }
                ColumnKind::Feedback => feedback(layout, result),
            };
            cells.push(cell);
        }

        Ok(Self { cells })
    }
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// `0.60` on the unit scale, `60%` on the percent scale.
pub fn format_score(value: f64, scale: ScoreScale) -> String {
    match scale {
        ScoreScale::Unit => format!("{value:.2}"),
        ScoreScale::Percent => format!("{value:.0}%"),
    }
}

/// `title: text` for every step that did not pass, in report order.
///
/// The text is the oracle's improvement suggestion when it gave one,
/// otherwise the step analysis. A fatal step judged as failed is prefixed
/// with [`CRITICAL_PREFIX`]; an errored fatal step is not.
pub fn feedback(layout: &ReportLayout, result: &AuditResult) -> String {
    layout
        .feedback_order()
        .iter()
        .filter_map(|id| result.step(id.as_str()))
        .filter(|step| !step.passed)
        .map(|step| {
            let title = layout.step_title(&step.step_id).unwrap_or(step.step_id.as_str());
            let text = step
                .improvements
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(step.analysis.as_str());
            let prefix = if layout.is_fatal(&step.step_id) && step.evaluation_error.is_none() {
                CRITICAL_PREFIX
            } else {
                ""
            };
            format!("{prefix}{title}: {}", text.trim())
        })
        .collect::<Vec<_>>()
        .join("; ")
}
