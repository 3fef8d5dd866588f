//! # threadaudit-report
//!
//! Maps an [`AuditResult`](threadaudit_contracts::result::AuditResult) onto
//! the fixed spreadsheet layout downstream consumers read.
//!
//! ```rust,ignore
//! let layout = ReportLayout::for_catalog(&catalog)?;
//! let row = ReportRow::render(&layout, &ReportMeta::from_conversation(&conv, case), &result)?;
//! std::fs::write("audit_report.csv", to_csv(&layout, &[row]))?;
//! ```

pub mod csv;
pub mod layout;
pub mod row;

pub use csv::{header_record, rows_to_csv, to_csv};
pub use layout::{ColumnKind, ReportColumn, ReportLayout, REPORT_SCHEMA_VERSION};
pub use row::{ReportMeta, ReportRow};

// ── Tests ─────────────────────────────────────────────────────────────────────
