//! # threadaudit-core
//!
//! The deterministic audit pipeline for threadaudit.
//!
//! ## Overview
//!
//! - [`traits`]: the `ReasoningOracle` and `RunLedger` seams.
//! - [`evaluator::StepEvaluator`]: one step against one conversation, with
//!   timeout, bounded retries, clamping, and pass-threshold normalization.
//! - [`scoring::ScoringEngine`]: category subtotals, weighted quality score,
//!   and the fatal override.
//! - [`orchestrator::AuditOrchestrator`]: bounded fan-out over every step,
//!   catalog-order reassembly, conversation deadline, and batch runs.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use threadaudit_core::AuditOrchestrator;
//!
//! let orchestrator = AuditOrchestrator::new(oracle);
//! let result = orchestrator.run(&conversation, &Arc::new(catalog)).await?;
//! println!("final score: {}", result.final_score);
//! ```

pub mod evaluator;
pub mod orchestrator;
pub mod scoring;
pub mod traits;

pub use evaluator::StepEvaluator;
pub use orchestrator::{AuditOrchestrator, ConversationOutcome};
pub use scoring::ScoringEngine;
pub use traits::{ReasoningOracle, RunLedger};

// ── Tests ─────────────────────────────────────────────────────────────────────
