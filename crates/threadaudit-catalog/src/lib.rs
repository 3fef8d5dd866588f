//! # threadaudit-catalog
//!
//! Declarative audit step catalog and category schema for threadaudit.
//!
//! ## Overview
//!
//! A catalog file declares `[settings]`, `[[categories]]`, and `[[steps]]`.
//! [`AuditCatalog`] loads and cross-validates all three in one pass and
//! reports every problem it finds, so a catalog author fixes the whole file
//! at once rather than one error per run.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use threadaudit_catalog::AuditCatalog;
//!
//! let catalog = AuditCatalog::from_file(Path::new("catalogs/travel.toml"))?;
//! for step in catalog.steps().steps_in_order() {
//!     println!("{} -> {}", step.id, step.report_column);
//! }
//! ```
//!
//! ## Ordering
//!
//! Steps keep declaration order. A category's members are the steps that
//! name it, in declaration order; that is also their report column order.

pub mod catalog;
pub mod config;
pub mod reload;

pub use catalog::{AuditCatalog, CategorySchema, StepCatalog};
pub use config::{CatalogConfig, CategoryConfig, StepConfig};
pub use reload::CatalogHandle;

// ── Tests ─────────────────────────────────────────────────────────────────────
