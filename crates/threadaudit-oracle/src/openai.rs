//! OpenAI-compatible chat completions backend.
//!
//! Serves `openai`, `grok`, and `groq`: all three speak the same
//! `/chat/completions` dialect and differ only in base URL, model, and key.

use async_trait::async_trait;
use serde_json::json;
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

pub struct OpenAiCompatibleOracle {
    config: OracleConfig,
    client: reqwest::Client,
    parser: JudgmentParser,
}

impl OpenAiCompatibleOracle {
    pub fn new(config: OracleConfig) -> ThreadAuditResult<Self> {
        Ok(Self {
            config,
            client: build_client()?,
            parser: JudgmentParser::new(),
        })
    }
}

#[async_trait]
impl ReasoningOracle for OpenAiCompatibleOracle {
    async fn judge(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError> {
        let url = endpoint(&self.config.base_url, "chat/completions");
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": render_user_prompt(request) },
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        debug!(
            provider = self.config.provider.as_str(),
            model = %self.config.model,
            step_id = %request.step_id,
            "sending chat completion"
        );

        let payload = send_json(
            self.client
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(&body),
            request.timeout,
        )
        .await?;

        let text = payload
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| OracleError::MalformedResponse {
                reason: "chat completion response missing choices[0].message.content".into(),
            })?;

        self.parser.parse(text)
    }

    fn provider_name(&self) -> &'static str {
        self.config.provider.as_str()
    }
}
