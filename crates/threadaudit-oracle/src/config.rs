//! Oracle provider configuration.
//!
//! Resolution order for every field: explicit value, then environment,
//! then the provider default. API keys only ever come from the
//! provider's own environment variable (or an explicit value in tests).
//!
//! | Provider    | Default model                                | Key variable          |
//! |-------------|----------------------------------------------|-----------------------|
//! | `openai`    | `gpt-4o`                                     | `OPENAI_API_KEY`      |
//! | `anthropic` | `claude-3-opus-20240229`                     | `ANTHROPIC_API_KEY`   |
//! | `grok`      | `grok-3-beta`                                | `GROK_API_KEY`        |
//! | `groq`      | `meta-llama/llama-4-scout-17b-16e-instruct`  | `GROQ_API_KEY`        |

use std::fmt;
use std::str::FromStr;

use threadaudit_contracts::error::{
    ConfigErrorKind, ConfigViolation, ThreadAuditError, ThreadAuditResult,
};

pub const ENV_PROVIDER: &str = "THREADAUDIT_PROVIDER";
pub const ENV_MODEL: &str = "THREADAUDIT_MODEL";
pub const ENV_TEMPERATURE: &str = "THREADAUDIT_TEMPERATURE";
pub const ENV_BASE_URL: &str = "THREADAUDIT_BASE_URL";

/// Supported judgment backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleProvider {
    OpenAi,
    Anthropic,
    Grok,
    Groq,
}

impl OracleProvider {
    pub const ALL: [OracleProvider; 4] = [Self::OpenAi, Self::Anthropic, Self::Grok, Self::Groq];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Grok => "grok",
            Self::Groq => "groq",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::Anthropic => "claude-3-opus-20240229",
            Self::Grok => "grok-3-beta",
            Self::Groq => "meta-llama/llama-4-scout-17b-16e-instruct",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com",
            Self::Grok => "https://api.x.ai/v1",
            Self::Groq => "https://api.groq.com/openai/v1",
        }
    }

    pub fn api_key_env(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Grok => "GROK_API_KEY",
            Self::Groq => "GROQ_API_KEY",
        }
    }
}

impl fmt::Display for OracleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OracleProvider {
    type Err = ThreadAuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| {
                ThreadAuditError::config(
                    ConfigErrorKind::InvalidSetting,
                    "oracle.provider",
                    format!(
                        "unsupported provider '{s}'; expected one of openai, anthropic, grok, groq"
                    ),
                )
            })
    }
}

/// Caller-supplied values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct OracleOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

/// A fully resolved backend configuration.
#[derive(Clone, PartialEq)]
pub struct OracleConfig {
    pub provider: OracleProvider,
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
    pub api_key: String,
    pub max_tokens: u32,
}

// Keeps the API key out of logs.
impl fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OracleConfig {
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;

    /// Defaults for `provider` with an explicit key.
    pub fn new(provider: OracleProvider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            temperature: 0.0,
            base_url: provider.default_base_url().to_string(),
            api_key: api_key.into(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Resolve from the process environment only.
    pub fn from_env() -> ThreadAuditResult<Self> {
        Self::resolve(&OracleOverrides::default(), &process_env)
    }

    /// Resolve from `overrides`, falling back to `env` and provider defaults.
    ///
    /// Every problem (bad provider, bad temperature, missing key) is
    /// reported together in one `Config` error.
    pub fn resolve(
        overrides: &OracleOverrides,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> ThreadAuditResult<Self> {
        let pick = |explicit: &Option<String>, var: &str| {
            explicit
                .clone()
                .or_else(|| env(var))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut violations = Vec::new();
        let provider = match pick(&overrides.provider, ENV_PROVIDER) {
            Some(raw) => match raw.parse::<OracleProvider>() {
                Ok(p) => p,
                Err(e) => {
                    collect(&mut violations, e);
                    OracleProvider::OpenAi
                }
            },
            None => OracleProvider::OpenAi,
        };

        let temperature = match pick(&overrides.temperature, ENV_TEMPERATURE) {
            Some(raw) => parse_temperature(&raw, "oracle.temperature").unwrap_or_else(|v| {
                violations.push(v);
                0.0
            }),
            None => 0.0,
        };

        let api_key = pick(&overrides.api_key, provider.api_key_env());
        if api_key.is_none() {
            violations.push(missing_key(provider));
        }

        if !violations.is_empty() {
            return Err(ThreadAuditError::Config { violations });
        }

        Ok(Self {
            provider,
            model: pick(&overrides.model, ENV_MODEL)
                .unwrap_or_else(|| provider.default_model().to_string()),
            temperature,
            base_url: pick(&overrides.base_url, ENV_BASE_URL)
                .unwrap_or_else(|| provider.default_base_url().to_string()),
            api_key: api_key.unwrap_or_default(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        })
    }

    /// Derive the configuration for a named profile.
    ///
    /// Reads `THREADAUDIT_<PROFILE>_PROVIDER`, `_MODEL`, and `_TEMPERATURE`.
    /// Switching provider resets model, base URL, and key to that
    /// provider's defaults unless the profile names a model.
    /// Returns `None` when the profile sets nothing.
    pub fn for_profile(
        &self,
        profile: &str,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> ThreadAuditResult<Option<Self>> {
        let prefix = format!(
            "THREADAUDIT_{}_",
            profile.to_ascii_uppercase().replace(['-', ' ', '.'], "_")
        );
        let var = |suffix: &str| {
            env(&format!("{prefix}{suffix}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let provider = var("PROVIDER");
        let model = var("MODEL");
        let temperature = var("TEMPERATURE");
        if provider.is_none() && model.is_none() && temperature.is_none() {
            return Ok(None);
        }

        let subject = format!("oracle.profile.{profile}");
        let mut violations = Vec::new();
        let mut out = self.clone();

        if let Some(raw) = provider {
            match raw.parse::<OracleProvider>() {
                Ok(p) if p != self.provider => match env(p.api_key_env()).filter(|k| !k.trim().is_empty()) {
                    Some(key) => {
                        out = Self::new(p, key.trim());
                        out.temperature = self.temperature;
                    }
                    None => violations.push(missing_key(p)),
                },
                Ok(_) => {}
                Err(e) => collect(&mut violations, e),
            }
        }
        if let Some(model) = model {
            out.model = model;
        }
        if let Some(raw) = temperature {
            match parse_temperature(&raw, &subject) {
                Ok(t) => out.temperature = t,
                Err(v) => violations.push(v),
            }
        }

        if violations.is_empty() {
            Ok(Some(out))
        } else {
            Err(ThreadAuditError::Config { violations })
        }
    }
}

pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn collect(violations: &mut Vec<ConfigViolation>, err: ThreadAuditError) {
    if let ThreadAuditError::Config { violations: v } = err {
        violations.extend(v);
    }
}

fn missing_key(provider: OracleProvider) -> ConfigViolation {
    ConfigViolation::new(
        ConfigErrorKind::InvalidSetting,
        "oracle.api_key",
        format!(
            "no API key for provider '{provider}'; set {}",
            provider.api_key_env()
        ),
    )
}

fn parse_temperature(raw: &str, subject: &str) -> Result<f32, ConfigViolation> {
    match raw.trim().parse::<f32>() {
        Ok(t) if t.is_finite() && (0.0..=2.0).contains(&t) => Ok(t),
        _ => Err(ConfigViolation::new(
            ConfigErrorKind::InvalidSetting,
            subject.to_string(),
            format!("temperature must be a number within 0.0..=2.0, got '{raw}'"),
        )),
    }
}
