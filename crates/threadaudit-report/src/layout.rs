//! Report column layout.
//!
//! The header text and column order are a compatibility contract with
//! downstream spreadsheet consumers. Any change to the fixed headers or to
//! the ordering rules below requires bumping [`REPORT_SCHEMA_VERSION`].
//!
//! Layout, left to right:
//!
//! 1. [`LEADING_HEADERS`]
//! 2. one column per step `report_column`, categories in schema order and
//!    members in catalog order within each
//! 3. [`SUMMARY_HEADERS`]
//! 4. one column per category title, schema order
//! 5. [`FEEDBACK_HEADER`]

use std::collections::{HashMap, HashSet};

use tracing::debug;

use threadaudit_catalog::AuditCatalog;
use threadaudit_contracts::{
    error::{ConfigErrorKind, ConfigViolation, ThreadAuditError, ThreadAuditResult},
    step::{CategoryId, StepId},
};

pub const REPORT_SCHEMA_VERSION: u32 = 1;

pub const LEADING_HEADERS: [&str; 5] = [
    "Audit ID",
    "Conversation ID",
    "Transaction ID",
    "Date of Audit",
    "Transaction Date",
];

pub const SUMMARY_HEADERS: [&str; 5] = [
    "Max Score",
    "Quality Score",
    "Score without Fatal",
    "FATAL Transaction",
    "Final Score",
];

pub const FEEDBACK_HEADER: &str = "FEEDBACK";

/// What a single report column holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    AuditId,
    ConversationId,
    TransactionId,
    AuditDate,
    TransactionDate,
    Step(StepId),
    MaxScore,
    QualityScore,
    ScoreWithoutFatal,
    FatalTransaction,
    FinalScore,
    Category(CategoryId),
    Feedback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportColumn {
    pub header: String,
    pub kind: ColumnKind,
}

/// Ordered columns for one catalog, plus the step facts rows need.
#[derive(Debug, Clone)]
pub struct ReportLayout {
    schema_version: u32,
    columns: Vec<ReportColumn>,
    step_titles: HashMap<StepId, String>,
    fatal_steps: HashSet<StepId>,
    feedback_order: Vec<StepId>,
    max_score: f64,
}

impl ReportLayout {
    /// Derive the layout from a loaded catalog.
    ///
    /// Fails with `DuplicateReportColumn` for every step column or category
    /// title that reuses one of the fixed headers.
    pub fn for_catalog(catalog: &AuditCatalog) -> ThreadAuditResult<Self> {
        let fixed: Vec<&str> = LEADING_HEADERS
            .iter()
            .chain(SUMMARY_HEADERS.iter())
            .chain(std::iter::once(&FEEDBACK_HEADER))
            .copied()
            .collect();
        let mut violations = Vec::new();

        let mut columns: Vec<ReportColumn> = LEADING_HEADERS
            .iter()
            .zip([
                ColumnKind::AuditId,
                ColumnKind::ConversationId,
                ColumnKind::TransactionId,
                ColumnKind::AuditDate,
                ColumnKind::TransactionDate,
            ])
            .map(|(header, kind)| ReportColumn {
                header: (*header).to_string(),
                kind,
            })
            .collect();

        let report_order = catalog.report_order();
        for step in &report_order {
            if fixed.contains(&step.report_column.as_str()) {
                violations.push(ConfigViolation::new(
                    ConfigErrorKind::DuplicateReportColumn,
                    format!("step '{}'", step.id),
                    format!("report column '{}' is a reserved report header", step.report_column),
                ));
            }
            columns.push(ReportColumn {
                header: step.report_column.clone(),
                kind: ColumnKind::Step(step.id.clone()),
            });
        }

        columns.extend(
            SUMMARY_HEADERS
                .iter()
                .zip([
                    ColumnKind::MaxScore,
                    ColumnKind::QualityScore,
                    ColumnKind::ScoreWithoutFatal,
                    ColumnKind::FatalTransaction,
                    ColumnKind::FinalScore,
                ])
                .map(|(header, kind)| ReportColumn {
                    header: (*header).to_string(),
                    kind,
                }),
        );

        for category in catalog.schema().categories_in_order() {
            if fixed.contains(&category.title.as_str()) {
                violations.push(ConfigViolation::new(
                    ConfigErrorKind::DuplicateReportColumn,
                    format!("category '{}'", category.id),
                    format!("title '{}' is a reserved report header", category.title),
                ));
            }
            columns.push(ReportColumn {
                header: category.title.clone(),
                kind: ColumnKind::Category(category.id.clone()),
            });
        }

        columns.push(ReportColumn {
            header: FEEDBACK_HEADER.to_string(),
            kind: ColumnKind::Feedback,
        });

        if !violations.is_empty() {
            return Err(ThreadAuditError::Config { violations });
        }

        debug!(
            columns = columns.len(),
            schema_version = REPORT_SCHEMA_VERSION,
            "report layout built"
        );

        Ok(Self {
            schema_version: REPORT_SCHEMA_VERSION,
            columns,
            step_titles: catalog
                .steps()
                .steps_in_order()
                .iter()
                .map(|s| (s.id.clone(), s.title.clone()))
                .collect(),
            fatal_steps: catalog
                .steps()
                .steps_in_order()
                .iter()
                .filter(|s| s.is_fatal)
                .map(|s| s.id.clone())
                .collect(),
            feedback_order: report_order.iter().map(|s| s.id.clone()).collect(),
            max_score: catalog.steps().total_max_score(),
        })
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn columns(&self) -> &[ReportColumn] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub(crate) fn step_title(&self, step_id: &StepId) -> Option<&str> {
        self.step_titles.get(step_id).map(String::as_str)
    }

    /// Step ids in the order their feedback appears.
    pub(crate) fn is_fatal(&self, step_id: &StepId) -> bool {
        self.fatal_steps.contains(step_id)
    }

    pub(crate) fn feedback_order(&self) -> &[StepId] {
        &self.feedback_order
    }

    /// Sum of every step's `max_score`.
    pub fn max_score(&self) -> f64 {
        self.max_score
    }
}
