//! Per-step oracle selection.
//!
//! Steps may name a profile (`"reasoning"`, `"detail"`, ...). The router is
//! itself a `ReasoningOracle`, so the evaluator never sees the dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use threadaudit_contracts::oracle::{OracleError, OracleRequest, OracleResponse};
use threadaudit_core::ReasoningOracle;

pub struct ProfileRouter {
    default: Arc<dyn ReasoningOracle>,
    profiles: HashMap<String, Arc<dyn ReasoningOracle>>,
}

impl ProfileRouter {
    pub fn new(default: Arc<dyn ReasoningOracle>) -> Self {
        Self {
            default,
            profiles: HashMap::new(),
        }
    }

    pub fn with_profile(mut self, name: impl Into<String>, oracle: Arc<dyn ReasoningOracle>) -> Self {
        self.profiles.insert(name.into(), oracle);
        self
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    fn select(&self, profile: Option<&str>) -> &Arc<dyn ReasoningOracle> {
        match profile {
            None => &self.default,
            Some(name) => self.profiles.get(name).unwrap_or_else(|| {
                warn!(profile = name, "unknown oracle profile; using default oracle");
                &self.default
            }),
        }
    }
}

#[async_trait]
impl ReasoningOracle for ProfileRouter {
    async fn judge(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError> {
        self.select(request.profile.as_deref()).judge(request).await
    }

    fn provider_name(&self) -> &'static str {
        self.default.provider_name()
    }
}
