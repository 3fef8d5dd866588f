//! # threadaudit-judgment
//!
//! Everything between an oracle request and a typed judgment that does not
//! depend on the transport:
//!
//! - [`prompt`] renders the system and user prompt every backend sends.
//! - [`parser::JudgmentParser`] extracts the JSON judgment from free-form
//!   model text and validates it against a JSON Schema via the `jsonschema`
//!   crate, reporting every structural violation at once.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use threadaudit_judgment::JudgmentParser;
//!
//! let parser = JudgmentParser::new();
//! let judgment = parser.parse(r#"{"score": 4, "passed": true, "rationale": "ok"}"#)?;
//! ```

pub mod parser;
pub mod prompt;

pub use parser::JudgmentParser;
pub use prompt::{render_user_prompt, SYSTEM_PROMPT};

// ── Tests ─────────────────────────────────────────────────────────────────────
