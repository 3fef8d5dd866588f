//! Catalog file schema.
//!
//! A `CatalogConfig` is deserialized from TOML as-is, with no validation.
//! Text fields default to empty so that a missing field becomes a
//! `MissingField` violation reported alongside every other problem, instead
//! of a parse error that hides the rest.
//!
//! Example:
//! ```toml
//! name = "travel-desk"
//!
//! [settings.scoring]
//! pass_threshold = 0.7
//! scale = "percent"
//!
//! [[categories]]
//! id = "communication"
//! title = "Communication"
//!
//! [[steps]]
//! id = "greeting"
//! title = "Greeting and Tone"
//! prompt = "Did the agent greet the customer politely?"
//! category = "communication"
//! max_score = 3.0
//! report_column = "Greeting and Tone"
//! ```

use serde::{Deserialize, Serialize};

use threadaudit_contracts::settings::AuditSettings;

fn default_weight() -> f64 {
    1.0
}

/// A `[[categories]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    #[serde(default)]
    pub id: String,
    /// Report header for the category subtotal column.
    #[serde(default)]
    pub title: String,
}

/// A `[[steps]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub prompt: String,
    /// Id of a declared `[[categories]]` entry.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub max_score: f64,
    #[serde(default)]
    pub is_fatal: bool,
    #[serde(default)]
    pub report_column: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub profile: Option<String>,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            prompt: String::new(),
            category: String::new(),
            max_score: 0.0,
            is_fatal: false,
            report_column: String::new(),
            weight: default_weight(),
            profile: None,
        }
    }
}

/// Top-level catalog document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Free-form catalog name shown by the CLI.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub settings: AuditSettings,
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}
