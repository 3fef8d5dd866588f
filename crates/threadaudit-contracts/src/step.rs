//! Audit step and category definitions.
//!
//! These are the validated, immutable shapes produced by the catalog loader.
//! Nothing in this module checks invariants; `threadaudit-catalog` is the only
//! producer and enforces them at load time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of one audit step, e.g. `StepId("limo_offering")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepId(pub String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identifier of one category, e.g. `CategoryId("communication")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(pub String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One configured audit criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Unique across the catalog, never empty.
    pub id: StepId,
    pub title: String,
    /// Instruction text handed to the reasoning oracle. Opaque to scoring.
    pub prompt: String,
    /// Must resolve to a declared category.
    pub category: CategoryId,
    /// Ceiling for this step's raw score. Always `> 0`.
    pub max_score: f64,
    /// An explicit failing judgment on this step zeroes the final score.
    pub is_fatal: bool,
    /// Exact output header text. Unique across every header in the report.
    pub report_column: String,
    /// Weight in the overall average. `0` tracks the step without averaging it.
    pub weight: f64,
    /// Optional oracle profile (e.g. `"reasoning"`) the step should be judged by.
    pub profile: Option<String>,
}

impl StepDefinition {
    /// True if this step participates in the weighted quality score.
    pub fn is_weighted(&self) -> bool {
        self.weight > 0.0
    }
}

/// A named bucket of steps used for subtotal reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub id: CategoryId,
    /// Output header text for this category's subtotal column.
    pub title: String,
    /// Member step ids in report column order.
    pub members: Vec<StepId>,
}
