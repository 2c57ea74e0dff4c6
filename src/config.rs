//! Configuration system for the code generation service
//!
//! Configuration is read from an optional TOML file and then overlaid with
//! environment variables. Every field has a default so the service can start
//! without a file at all. The LLM API key is never stored in the file; only
//! the name of the environment variable holding it.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
}

/// HTTP server section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served under `/static`, if present
    pub static_dir: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Supported LLM provider families
///
/// Gemini is reached through Google's OpenAI-compatible endpoint, so both
/// variants share one wire implementation and differ in defaults only.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    #[default]
    OpenAi,
    Gemini,
}

impl LlmProviderKind {
    /// Parse a provider name, case-insensitively
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }

    /// Base URL used when the configuration does not name one
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }
}

/// LLM section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSection {
    #[serde(default)]
    pub provider: LlmProviderKind,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable containing the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    pub base_url: Option<String>,
    /// Optional temperature (0.0 to 2.0)
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            base_url: None,
            temperature: None,
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmSection {
    /// Base URL for the configured provider
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
    }
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_api_key_env() -> String {
    "LLM_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Application section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppSection {
    #[serde(default = "default_app_env")]
    pub env: String,
    #[serde(default)]
    pub debug: bool,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            env: default_app_env(),
            debug: false,
        }
    }
}

fn default_app_env() -> String {
    "development".to_string()
}

/// Pipeline execution section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelineSection {
    /// Run review, optimization and test generation concurrently
    #[serde(default)]
    pub parallel_analysis: bool,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Unsupported LLM provider: {0}")]
    UnsupportedProvider(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AppConfig {
    /// Load configuration from a TOML file, apply environment overrides, validate
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.finish(|name| std::env::var(name).ok())
    }

    /// Built-in defaults with environment overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        AppConfig::default().finish(|name| std::env::var(name).ok())
    }

    fn finish<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.apply_overrides(lookup)?;
        self.validate()?;
        Ok(self)
    }

    /// Overlay values from the given variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = LlmProviderKind::parse(&provider)?;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(base_url) = lookup("LLM_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.llm.base_url = Some(base_url);
        }
        if let Some(env) = lookup("APP_ENV") {
            self.app.env = env;
        }
        if let Some(debug) = lookup("DEBUG") {
            self.app.debug = parse_bool(&debug).ok_or_else(|| {
                ConfigError::InvalidConfig(format!("DEBUG must be a boolean, got '{debug}'"))
            })?;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| {
                ConfigError::InvalidConfig(format!("PORT must be a port number, got '{port}'"))
            })?;
        }
        Ok(())
    }

    /// Check field-level constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "llm.model must not be empty".to_string(),
            ));
        }

        if self.llm.api_key_env.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "llm.api_key_env must not be empty".to_string(),
            ));
        }

        if let Some(base_url) = &self.llm.base_url {
            let parsed = Url::parse(base_url).map_err(|e| {
                ConfigError::InvalidConfig(format!("llm.base_url '{base_url}' is invalid: {e}"))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidConfig(format!(
                    "llm.base_url must use http or https, got '{}'",
                    parsed.scheme()
                )));
            }
        }

        if let Some(temperature) = self.llm.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidConfig(format!(
                    "llm.temperature must be between 0.0 and 2.0, got {temperature}"
                )));
            }
        }

        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "llm.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Get LLM API key from the configured environment variable
    pub fn get_llm_api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::EnvVarNotFound(self.llm.api_key_env.clone()))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_full_config() {
        let toml_content = r#"
[server]
host = "0.0.0.0"
port = 9000
static_dir = "web/frontend"

[llm]
provider = "gemini"
model = "gemini-1.5-pro"
api_key_env = "GEMINI_API_KEY"
temperature = 0.2
max_tokens = 2048
timeout_secs = 30

[app]
env = "production"
debug = true

[pipeline]
parallel_analysis = true
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.static_dir.as_deref(), Some("web/frontend"));
        assert_eq!(config.llm.provider, LlmProviderKind::Gemini);
        assert_eq!(config.llm.model, "gemini-1.5-pro");
        assert_eq!(config.llm.temperature, Some(0.2));
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.app.env, "production");
        assert!(config.app.debug);
        assert!(config.pipeline.parallel_analysis);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.provider, LlmProviderKind::OpenAi);
        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.llm.api_key_env, "LLM_API_KEY");
        assert_eq!(config.app.env, "development");
        assert!(!config.pipeline.parallel_analysis);
    }

    #[test]
    fn test_unknown_provider_rejected_at_parse() {
        let result: Result<AppConfig, _> = toml::from_str("[llm]\nprovider = \"cohere\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_resolved_base_url_defaults_per_provider() {
        let mut section = LlmSection::default();
        assert_eq!(section.resolved_base_url(), "https://api.openai.com/v1");

        section.provider = LlmProviderKind::Gemini;
        assert!(section
            .resolved_base_url()
            .starts_with("https://generativelanguage.googleapis.com"));

        section.base_url = Some("http://localhost:11434/v1".to_string());
        assert_eq!(section.resolved_base_url(), "http://localhost:11434/v1");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup_from(&[
                ("LLM_PROVIDER", "Gemini"),
                ("LLM_MODEL", "gemini-pro"),
                ("APP_ENV", "staging"),
                ("DEBUG", "true"),
                ("HOST", "0.0.0.0"),
                ("PORT", "8081"),
            ]))
            .unwrap();

        assert_eq!(config.llm.provider, LlmProviderKind::Gemini);
        assert_eq!(config.llm.model, "gemini-pro");
        assert_eq!(config.app.env, "staging");
        assert!(config.app.debug);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8081);
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides(lookup_from(&[("PORT", "eighty")]));
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_unsupported_provider_override() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides(lookup_from(&[("LLM_PROVIDER", "anthropic")]));
        assert!(matches!(result, Err(ConfigError::UnsupportedProvider(_))));
    }

    #[test]
    fn test_blank_base_url_override_ignored() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup_from(&[("LLM_BASE_URL", "  ")]))
            .unwrap();
        assert!(config.llm.base_url.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = AppConfig::default();
        config.llm.base_url = Some("ftp://example.com".to_string());
        assert!(config.validate().is_err());

        config.llm.base_url = Some("not a url".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_temperature() {
        let mut config = AppConfig::default();
        config.llm.temperature = Some(2.5);
        assert!(config.validate().is_err());

        config.llm.temperature = Some(0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.llm.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_missing_api_key_env() {
        let mut config = AppConfig::default();
        config.llm.api_key_env = "CODEGEN_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        assert!(matches!(
            config.get_llm_api_key(),
            Err(ConfigError::EnvVarNotFound(_))
        ));
    }
}
