//! Provider factory
//!
//! The only place that branches on [`LlmProviderKind`]. Everything downstream
//! holds an `Arc<dyn LlmProvider>`.

use crate::config::{LlmProviderKind, LlmSection};
use crate::llm::provider::{LlmError, LlmProvider};
use crate::llm::providers::{OpenAiConfig, OpenAiProvider};
use std::sync::Arc;
use std::time::Duration;

/// Build the configured provider with an already resolved API key
pub fn build_provider(
    section: &LlmSection,
    api_key: String,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let config = OpenAiConfig {
        api_key,
        base_url: section.resolved_base_url(),
        timeout: Duration::from_secs(section.timeout_secs),
        provider_name: section.provider.as_str().to_string(),
    };

    let provider: Arc<dyn LlmProvider> = match section.provider {
        LlmProviderKind::OpenAi | LlmProviderKind::Gemini => Arc::new(OpenAiProvider::new(config)?),
    };

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_openai_provider() {
        let section = LlmSection::default();
        let provider = build_provider(&section, "test-key".to_string()).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_build_gemini_provider() {
        let section = LlmSection {
            provider: LlmProviderKind::Gemini,
            ..Default::default()
        };
        let provider = build_provider(&section, "test-key".to_string()).unwrap();
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn test_build_without_key_fails() {
        let result = build_provider(&LlmSection::default(), String::new());
        assert!(matches!(result, Err(LlmError::NotConfigured(_))));
    }
}
