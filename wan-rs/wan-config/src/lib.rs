use std::{env, fmt};

use thiserror::Error;

pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_ENV_VAR: &str = "GEMINI_MODEL";
pub const THINKING_BUDGET_ENV_VAR: &str = "GEMINI_THINKING_BUDGET";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_THINKING_BUDGET: u32 = 0;

pub const API_KEY_URL: &str = "https://makersuite.google.com/app/apikey";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no API key found")]
    MissingApiKey,
    #[error("GEMINI_THINKING_BUDGET must be a non-negative integer, got `{value}`")]
    InvalidThinkingBudget { value: String },
}

impl ConfigError {
    /// Remediation text shown to the user alongside the error.
    pub fn guidance(&self) -> String {
        match self {
            Self::MissingApiKey => format!(
                "Please set {API_KEY_ENV_VAR} in .env file or use --api-key argument.\n\n\
                 Get your API key at: {API_KEY_URL}\n\
                 Tip: Copy .env-example to .env and add your key"
            ),
            Self::InvalidThinkingBudget { .. } => format!(
                "Unset {THINKING_BUDGET_ENV_VAR} to use the default of {DEFAULT_THINKING_BUDGET}, \
                 or set it to a whole number such as 0 or 1024."
            ),
        }
    }
}

/// Settings fixed for the lifetime of one session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub api_key: String,
    pub model: String,
    pub thinking_budget: u32,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("thinking_budget", &self.thinking_budget)
            .finish()
    }
}

/// Resolve the session configuration from explicit values and the process
/// environment.
///
/// Each setting takes the first non-blank value from: the explicit argument,
/// the matching environment variable, then the built-in default. The API key
/// has no default.
///
/// # Errors
///
/// Returns [`ConfigError::MissingApiKey`] when no key is available and
/// [`ConfigError::InvalidThinkingBudget`] when the budget variable is not a
/// non-negative integer.
pub fn resolve_config(
    explicit_api_key: Option<&str>,
    explicit_model: Option<&str>,
) -> Result<SessionConfig, ConfigError> {
    resolve_config_with(explicit_api_key, explicit_model, |key| env::var(key).ok())
}

/// Same as [`resolve_config`] with the environment supplied by `lookup`.
pub fn resolve_config_with(
    explicit_api_key: Option<&str>,
    explicit_model: Option<&str>,
    mut lookup: impl FnMut(&str) -> Option<String>,
) -> Result<SessionConfig, ConfigError> {
    let api_key = first_present(explicit_api_key, lookup(API_KEY_ENV_VAR))
        .ok_or(ConfigError::MissingApiKey)?;

    let model = first_present(explicit_model, lookup(MODEL_ENV_VAR))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let thinking_budget = parse_thinking_budget(lookup(THINKING_BUDGET_ENV_VAR).as_deref())?;

    let config = SessionConfig {
        api_key,
        model,
        thinking_budget,
    };
    tracing::debug!(
        model = %config.model,
        thinking_budget = config.thinking_budget,
        "resolved session configuration"
    );
    Ok(config)
}

fn first_present(explicit: Option<&str>, from_env: Option<String>) -> Option<String> {
    explicit
        .map(str::to_string)
        .into_iter()
        .chain(from_env)
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn parse_thinking_budget(raw: Option<&str>) -> Result<u32, ConfigError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(DEFAULT_THINKING_BUDGET),
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidThinkingBudget {
                value: value.to_string(),
            }),
    }
}
