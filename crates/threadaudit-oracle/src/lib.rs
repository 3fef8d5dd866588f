//! # threadaudit-oracle
//!
//! Concrete [`ReasoningOracle`](threadaudit_core::ReasoningOracle) backends.
//!
//! - [`openai::OpenAiCompatibleOracle`] for `openai`, `grok`, and `groq`
//! - [`anthropic::AnthropicOracle`] for `anthropic`
//! - [`router::ProfileRouter`] dispatches per-step profiles to backends
//!
//! Provider choice is resolved once, in [`factory::build_oracle`]; nothing
//! downstream branches on it.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use threadaudit_oracle::{build_oracle, OracleConfig};
//!
//! let oracle = build_oracle(OracleConfig::from_env()?)?;
//! ```

pub mod anthropic;
pub mod config;
pub mod factory;
mod http;
pub mod openai;
pub mod router;

pub use anthropic::AnthropicOracle;
pub use config::{OracleConfig, OracleOverrides, OracleProvider};
pub use factory::{build_oracle, build_router};
pub use openai::OpenAiCompatibleOracle;
pub use router::ProfileRouter;

// ── Tests ─────────────────────────────────────────────────────────────────────
