//! Anthropic messages API backend.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use threadaudit_contracts::{
    error::ThreadAuditResult,
    oracle::{OracleError, OracleRequest, OracleResponse},
};
use threadaudit_core::ReasoningOracle;
use threadaudit_judgment::{render_user_prompt, JudgmentParser, SYSTEM_PROMPT};

use crate::{
    config::OracleConfig,
    http::{build_client, endpoint, send_json},
};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicOracle {
    config: OracleConfig,
    client: reqwest::Client,
    parser: JudgmentParser,
}

impl AnthropicOracle {
    pub fn new(config: OracleConfig) -> ThreadAuditResult<Self> {
        Ok(Self {
            config,
            client: build_client()?,
            parser: JudgmentParser::new(),
        })
    }
}

/// Text of the first `text` content block.
fn first_text_block(payload: &Value) -> Option<&str> {
    payload
        .get("content")?
        .as_array()?
        .iter()
        .find(|block| block.get("type").and_then(Value::as_str) == Some("text"))?
        .get("text")?
        .as_str()
}

#[async_trait]
impl ReasoningOracle for AnthropicOracle {
    async fn judge(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError> {
        let url = endpoint(&self.config.base_url, "v1/messages");
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": SYSTEM_PROMPT,
            "messages": [
                { "role": "user", "content": render_user_prompt(request) },
            ],
        });

        debug!(
            model = %self.config.model,
            step_id = %request.step_id,
            "sending anthropic message"
        );

        let payload = send_json(
            self.client
                .post(&url)
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body),
            request.timeout,
        )
        .await?;

        let text = first_text_block(&payload).ok_or_else(|| OracleError::MalformedResponse {
            reason: "messages response has no text content block".into(),
        })?;

        self.parser.parse(text)
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }
}
