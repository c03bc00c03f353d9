use std::env;

use tracing::info;

use crate::error::MatadorError;

pub const DEFAULT_PERSONA_MODEL: &str = "gpt-4o";
pub const DEFAULT_BRAND_MODEL: &str = "gpt-4o-mini";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // AI provider
    pub openai_api_key: String,
    pub persona_model: String,
    pub brand_model: String,
    pub structured_personas: bool,

    // Upstream directories
    pub google_api_key: String,
    pub census_api_key: Option<String>,

    // Persistence
    pub database_url: Option<String>,

    // Web server
    pub api_host: String,
    pub api_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, MatadorError> {
        Ok(Self {
            openai_api_key: required_env("OPENAI_API_KEY")?,
            persona_model: env::var("PERSONA_MODEL")
                .unwrap_or_else(|_| DEFAULT_PERSONA_MODEL.to_string()),
            brand_model: env::var("BRAND_MODEL")
                .unwrap_or_else(|_| DEFAULT_BRAND_MODEL.to_string()),
            structured_personas: parse_bool(env::var("STRUCTURED_PERSONAS").ok().as_deref())
                .unwrap_or(true),
            google_api_key: required_env("GOOGLE_API_KEY")?,
            census_api_key: optional_env("CENSUS_API_KEY"),
            database_url: Self::database_url_from_env(),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| MatadorError::Config("API_PORT must be a number".into()))?,
        })
    }

    /// `DATABASE_URL` alone, for tools that only read stored reports and
    /// need no API keys.
    pub fn database_url_from_env() -> Option<String> {
        optional_env("DATABASE_URL")
    }

    /// Log the effective configuration with secrets masked.
    pub fn log_redacted(&self) {
        info!(
            openai_api_key = %redact(&self.openai_api_key),
            google_api_key = %redact(&self.google_api_key),
            census = self.census_api_key.is_some(),
            database = self.database_url.is_some(),
            persona_model = %self.persona_model,
            brand_model = %self.brand_model,
            structured_personas = self.structured_personas,
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> Result<String, MatadorError> {
    optional_env(key)
        .ok_or_else(|| MatadorError::Config(format!("{key} environment variable is required")))
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: Option<&str>) -> Option<bool> {
    match value?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn redact(secret: &str) -> String {
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{tail}")
    }
}
