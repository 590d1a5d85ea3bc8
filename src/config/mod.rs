use std::env;
use anyhow::{Result, Context};
use tracing::{info, warn};

/// File extensions accepted by the upload intake, lower-case with leading dot.
pub const ALLOWED_EXTENSIONS: [&str; 5] = [".pdf", ".txt", ".csv", ".json", ".md"];

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.2-3b-instruct:free";

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub max_file_size_mb: usize,
    pub max_total_upload_mb: usize,
    pub max_context_words: usize,
    pub request_timeout_seconds: u64,
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub default_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub include_preamble: bool,
    pub app_referer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Read on its own because tracing is set up before [`Config::from_env`]
    /// so that configuration loading is itself logged.
    pub fn from_env() -> Self {
        env::var("LOG_FORMAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(LogFormat::Pretty)
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

// Keeps the API key out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("max_file_size_mb", &self.max_file_size_mb)
            .field("max_total_upload_mb", &self.max_total_upload_mb)
            .field("max_context_words", &self.max_context_words)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("openrouter_api_key", &self.api_key_hint())
            .field("openrouter_base_url", &self.openrouter_base_url)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("include_preamble", &self.include_preamble)
            .field("app_referer", &self.app_referer)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 5000,
            max_file_size_mb: 10,
            max_total_upload_mb: 20,
            max_context_words: 10_000,
            request_timeout_seconds: 120,
            openrouter_api_key: None,
            openrouter_base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 2000,
            include_preamble: true,
            app_referer: "http://localhost:5000".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let defaults = Config::default();

        let config = Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| {
                info!("SERVER_HOST not set, using default: {}", defaults.server_host);
                defaults.server_host.clone()
            }),
            server_port: Self::parse_env_var("SERVER_PORT", defaults.server_port)
                .context("Failed to parse SERVER_PORT")?,
            max_file_size_mb: Self::parse_env_var("MAX_FILE_SIZE_MB", defaults.max_file_size_mb)
                .context("Failed to parse MAX_FILE_SIZE_MB")?,
            max_total_upload_mb: Self::parse_env_var("MAX_TOTAL_UPLOAD_MB", defaults.max_total_upload_mb)
                .context("Failed to parse MAX_TOTAL_UPLOAD_MB")?,
            max_context_words: Self::parse_env_var("MAX_CONTEXT_WORDS", defaults.max_context_words)
                .context("Failed to parse MAX_CONTEXT_WORDS")?,
            request_timeout_seconds: Self::parse_env_var("REQUEST_TIMEOUT_SECONDS", defaults.request_timeout_seconds)
                .context("Failed to parse REQUEST_TIMEOUT_SECONDS")?,
            openrouter_api_key: env::var("OPENROUTER_API_KEY")
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            openrouter_base_url: env::var("OPENROUTER_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openrouter_base_url),
            default_model: env::var("OPENROUTER_MODEL")
                .ok()
                .map(|model| model.trim().to_string())
                .filter(|model| !model.is_empty())
                .unwrap_or(defaults.default_model),
            temperature: Self::parse_env_var("LLM_TEMPERATURE", defaults.temperature)
                .context("Failed to parse LLM_TEMPERATURE")?,
            max_tokens: Self::parse_env_var("LLM_MAX_TOKENS", defaults.max_tokens)
                .context("Failed to parse LLM_MAX_TOKENS")?,
            include_preamble: Self::parse_env_var("INCLUDE_PREAMBLE", defaults.include_preamble)
                .context("Failed to parse INCLUDE_PREAMBLE")?,
            app_referer: env::var("APP_REFERER").unwrap_or(defaults.app_referer),
        };

        config.validate()?;

        if config.openrouter_api_key.is_none() {
            warn!("No provider API key configured. Set OPENROUTER_API_KEY to enable chat.");
        }

        info!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    fn parse_env_var<T>(var_name: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr + Copy + std::fmt::Debug,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(val) => match val.trim().parse() {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                    Ok(default)
                }
            },
            Err(_) => {
                info!("{} not set, using default: {:?}", var_name, default);
                Ok(default)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT must be greater than 0"));
        }
        if self.max_file_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }
        if self.max_total_upload_mb < self.max_file_size_mb {
            return Err(anyhow::anyhow!(
                "MAX_TOTAL_UPLOAD_MB ({}) must be at least MAX_FILE_SIZE_MB ({})",
                self.max_total_upload_mb,
                self.max_file_size_mb
            ));
        }
        if self.max_context_words == 0 {
            return Err(anyhow::anyhow!("MAX_CONTEXT_WORDS must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECONDS must be greater than 0"));
        }
        if self.max_tokens == 0 {
            return Err(anyhow::anyhow!("LLM_MAX_TOKENS must be greater than 0"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(anyhow::anyhow!("LLM_TEMPERATURE must be between 0.0 and 2.0"));
        }
        if self.default_model.is_empty() {
            return Err(anyhow::anyhow!("OPENROUTER_MODEL must not be empty"));
        }
        Ok(())
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    pub fn max_total_upload_bytes(&self) -> usize {
        self.max_total_upload_mb * 1024 * 1024
    }

    pub fn is_api_key_configured(&self) -> bool {
        self.openrouter_api_key.is_some()
    }

    /// Short prefix of the API key, safe to print.
    pub fn api_key_hint(&self) -> String {
        match &self.openrouter_api_key {
            Some(key) if key.chars().count() > 12 => format!("{}...", key.chars().take(12).collect::<String>()),
            Some(_) => "(set)".to_string(),
            None => "(not set)".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_file_size_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.max_total_upload_bytes(), 20 * 1024 * 1024);
    }

    #[test]
    fn total_ceiling_below_per_file_ceiling_is_rejected() {
        let config = Config {
            max_file_size_mb: 10,
            max_total_upload_mb: 5,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_key_hint_never_reveals_full_key() {
        let config = Config {
            openrouter_api_key: Some("sk-or-v1-abcdefghijklmnop".to_string()),
            ..Config::default()
        };
        assert_eq!(config.api_key_hint(), "sk-or-v1-abc...");
        assert!(!format!("{:?}", config).contains("mnop"));
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
