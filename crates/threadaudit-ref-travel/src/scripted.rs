//! A deterministic, offline `ReasoningOracle`.
//!
//! Each step replays a list of scripted replies in order; once the list is
//! exhausted the last reply repeats. Steps without a script pass with full
//! marks. Every call is counted per step so scenarios can show retries.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use threadaudit_contracts::oracle::{OracleError, OracleRequest, OracleResponse};
use threadaudit_core::ReasoningOracle;

/// One canned oracle reply.
#[derive(Debug, Clone)]
pub enum Scripted {
    Judge {
        score: f64,
        passed: bool,
        rationale: String,
        improvements: Option<String>,
    },
    /// Fail as if the request ran past its deadline.
    Timeout,
    Transport(String),
    Malformed(String),
}

impl Scripted {
    pub fn pass(score: f64, rationale: &str) -> Self {
        Self::Judge {
            score,
            passed: true,
            rationale: rationale.to_string(),
            improvements: None,
        }
    }

    pub fn fail(score: f64, rationale: &str, improvements: &str) -> Self {
        Self::Judge {
            score,
            passed: false,
            rationale: rationale.to_string(),
            improvements: Some(improvements.to_string()),
        }
    }
}

#[derive(Default)]
pub struct ScriptedOracle {
    scripts: HashMap<String, Vec<Scripted>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a single reply for `step_id`.
    pub fn reply(self, step_id: &str, reply: Scripted) -> Self {
        self.replies(step_id, vec![reply])
    }

    /// Script a sequence of replies for `step_id`, one per call.
    pub fn replies(mut self, step_id: &str, replies: Vec<Scripted>) -> Self {
        self.scripts.insert(step_id.to_string(), replies);
        self
    }

    pub fn calls(&self, step_id: &str) -> usize {
        self.calls
            .lock()
            .expect("scripted oracle lock poisoned")
            .get(step_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .expect("scripted oracle lock poisoned")
            .values()
            .sum()
    }

    fn next_reply(&self, step_id: &str) -> Option<Scripted> {
        let call = {
            let mut calls = self.calls.lock().expect("scripted oracle lock poisoned");
            let count = calls.entry(step_id.to_string()).or_insert(0);
            *count += 1;
            *count - 1
        };
        let script = self.scripts.get(step_id)?;
        script.get(call).or_else(|| script.last()).cloned()
    }
}

#[async_trait]
impl ReasoningOracle for ScriptedOracle {
    async fn judge(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError> {
        let reply = self.next_reply(request.step_id.as_str());
        debug!(step_id = %request.step_id, reply = ?reply, "scripted oracle reply");

        match reply {
            None => Ok(OracleResponse {
                score: request.max_score,
                passed: true,
                rationale: "No issues found.".to_string(),
                improvements: None,
            }),
            Some(Scripted::Judge {
                score,
                passed,
                rationale,
                improvements,
            }) => Ok(OracleResponse {
                score,
                passed,
                rationale,
                improvements,
            }),
            Some(Scripted::Timeout) => Err(OracleError::timeout(request.timeout)),
            Some(Scripted::Transport(reason)) => Err(OracleError::Transport { reason }),
            Some(Scripted::Malformed(reason)) => Err(OracleError::MalformedResponse { reason }),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}
