//! Judgment parsing for raw oracle output.
//!
//! `JudgmentParser` turns model text into a typed `OracleResponse` in three
//! phases:
//!
//! 1. **Extraction**: strip Markdown code fences, find the first `{`, and
//!    stream-decode the first JSON value. Trailing chatter is ignored.
//! 2. **Structural**: validate the value against a compiled JSON Schema.
//!    Every violation is collected into one error message.
//! 3. **Typed**: read the fields into `OracleResponse`. `analysis` is
//!    accepted when `rationale` is absent, and a separate `reasoning` string
//!    is appended to the rationale.
//!
//! Nothing here clamps or interprets the score; that is the evaluator's job.

use serde_json::{json, Value};
use tracing::debug;

use threadaudit_contracts::oracle::{OracleError, OracleResponse};

fn judgment_schema() -> Value {
    json!({
        "type": "object",
        "required": ["score", "passed"],
        "anyOf": [
            { "required": ["rationale"] },
            { "required": ["analysis"] }
        ],
        "properties": {
            "score": { "type": "number" },
            "passed": { "type": "boolean" },
            "rationale": { "type": "string" },
            "analysis": { "type": "string" },
            "reasoning": { "type": ["string", "null"] },
            "improvements": { "type": ["string", "null"] }
        }
    })
}

/// Parses oracle text into a judgment.
///
/// Build once and share; the compiled schema is immutable.
pub struct JudgmentParser {
    validator: jsonschema::Validator,
}

impl JudgmentParser {
    pub fn new() -> Self {
        let validator = jsonschema::validator_for(&judgment_schema())
            .expect("built-in judgment schema must compile");
        Self { validator }
    }

    /// Parse `text` into an `OracleResponse`.
    ///
    /// Returns `OracleError::MalformedResponse` when no JSON object can be
    /// found, the object violates the schema, or the score is not finite.
    pub fn parse(&self, text: &str) -> Result<OracleResponse, OracleError> {
        let value = extract_json(text)?;

        let failures: Vec<String> = self
            .validator
            .iter_errors(&value)
            .map(|e| format!("at '{}': {}", e.instance_path, e))
            .collect();
        if !failures.is_empty() {
            debug!(count = failures.len(), "judgment failed schema validation");
            return Err(malformed(format!(
                "judgment does not match schema: {}",
                failures.join("; ")
            )));
        }

        let score = value
            .get("score")
            .and_then(Value::as_f64)
            .ok_or_else(|| malformed("score is not a number"))?;
        if !score.is_finite() {
            return Err(malformed(format!("score is not finite: {score}")));
        }
        let passed = value
            .get("passed")
            .and_then(Value::as_bool)
            .ok_or_else(|| malformed("passed is not a boolean"))?;

        let mut rationale = non_empty(&value, "rationale")
            .or_else(|| non_empty(&value, "analysis"))
            .unwrap_or_default();
        if let Some(reasoning) = non_empty(&value, "reasoning") {
            if rationale.is_empty() {
                rationale = reasoning;
            } else {
                rationale = format!("{rationale}\nReasoning: {reasoning}");
            }
        }

        Ok(OracleResponse {
            score,
            passed,
            rationale,
            improvements: non_empty(&value, "improvements"),
        })
    }
}

impl Default for JudgmentParser {
    fn default() -> Self {
        Self::new()
    }
}

fn malformed(reason: impl Into<String>) -> OracleError {
    OracleError::MalformedResponse {
        reason: reason.into(),
    }
}

fn non_empty(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Remove a surrounding ```json ... ``` fence if present.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Find and decode the first JSON object in `text`.
fn extract_json(text: &str) -> Result<Value, OracleError> {
    let text = strip_fences(text);
    let start = text
        .find('{')
        .ok_or_else(|| malformed("no JSON object found in oracle output"))?;

    serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| malformed("no JSON value after '{'"))?
        .map_err(|e| malformed(format!("invalid JSON: {e}")))
}
