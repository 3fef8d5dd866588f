//! Backend construction. The only place that matches on the provider.

use std::sync::Arc;

use tracing::info;

use threadaudit_contracts::error::ThreadAuditResult;
use threadaudit_core::ReasoningOracle;

use crate::{
    anthropic::AnthropicOracle,
    config::{OracleConfig, OracleProvider},
    openai::OpenAiCompatibleOracle,
    router::ProfileRouter,
};

pub fn build_oracle(config: OracleConfig) -> ThreadAuditResult<Arc<dyn ReasoningOracle>> {
    info!(
        provider = config.provider.as_str(),
        model = %config.model,
        temperature = config.temperature,
        "creating oracle backend"
    );
    let oracle: Arc<dyn ReasoningOracle> = match config.provider {
        OracleProvider::OpenAi | OracleProvider::Grok | OracleProvider::Groq => {
            Arc::new(OpenAiCompatibleOracle::new(config)?)
        }
        OracleProvider::Anthropic => Arc::new(AnthropicOracle::new(config)?),
    };
    Ok(oracle)
}

/// Build the default backend plus one backend per profile that has
/// environment overrides. Profiles without overrides use the default.
pub fn build_router<I>(
    base: OracleConfig,
    profiles: I,
    env: &dyn Fn(&str) -> Option<String>,
) -> ThreadAuditResult<ProfileRouter>
where
    I: IntoIterator<Item = String>,
{
    let default = build_oracle(base.clone())?;
    let mut router = ProfileRouter::new(Arc::clone(&default));

    for profile in profiles {
        let oracle = match base.for_profile(&profile, env)? {
            Some(config) => build_oracle(config)?,
            None => Arc::clone(&default),
        };
        router = router.with_profile(profile, oracle);
    }
    Ok(router)
}
