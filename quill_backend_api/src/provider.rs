use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{BackendError, BackendResult};

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Connection settings for one OpenAI-compatible provider.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Unique identifier, also used as the backend id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Bearer token; empty or `"ollama"` means no authorization header.
    #[serde(default)]
    pub api_key: String,
    /// Base URL up to and including the API version segment.
    #[serde(rename = "baseURL")]
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Completion token limit.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Whether this provider is the preferred one.
    #[serde(default)]
    pub is_default: bool,
}

impl ProviderConfig {
    /// Construct a provider with default sampling settings.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            api_key: String::new(),
            base_url: base_url.into(),
            model: model.into(),
            temperature: Some(DEFAULT_TEMPERATURE),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            is_default: false,
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Temperature to send, falling back to the default.
    pub fn effective_temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Token limit to send, falling back to the default.
    pub fn effective_max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    /// Whether requests carry an `Authorization: Bearer` header.
    pub fn uses_bearer_auth(&self) -> bool {
        !self.api_key.is_empty() && self.api_key != "ollama"
    }

    /// Chat completions endpoint derived from the base URL.
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Reject configurations that cannot produce a request.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Configuration`] when the base URL or model is blank.
    pub fn validate(&self) -> BackendResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(BackendError::configuration(format!(
                "provider {} has no base URL",
                self.id
            )));
        }
        if self.model.trim().is_empty() {
            return Err(BackendError::configuration(format!(
                "provider {} has no model",
                self.id
            )));
        }
        Ok(())
    }

    /// Starting points offered when adding a provider.
    pub fn templates() -> Vec<Self> {
        vec![
            Self::new("ollama", "Ollama (local)", "http://localhost:11434/v1", "llama3.2")
                .with_api_key("ollama"),
            Self::new("openai", "OpenAI", "https://api.openai.com/v1", "gpt-3.5-turbo"),
            Self::new("deepseek", "DeepSeek", "https://api.deepseek.com/v1", "deepseek-chat"),
            Self::new("moonshot", "Moonshot", "https://api.moonshot.cn/v1", "moonshot-v1-8k"),
            Self::new(
                "zhipu",
                "Zhipu AI",
                "https://open.bigmodel.cn/api/paas/v4",
                "glm-4-flash",
            ),
            Self::new(
                "anthropic",
                "Claude (Anthropic)",
                "https://api.anthropic.com/v1",
                "claude-3-sonnet-20240229",
            ),
            Self::new("custom", "Custom OpenAI-compatible", "", ""),
        ]
        .into_iter()
        .map(|mut template| {
            template.max_tokens = Some(4096);
            template
        })
        .collect()
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() {
            "<empty>"
        } else {
            "<redacted>"
        };
        f.debug_struct("ProviderConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("api_key", &api_key)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("is_default", &self.is_default)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_key() {
        let provider = ProviderConfig::new("openai", "OpenAI", "https://api.openai.com/v1", "gpt")
            .with_api_key("sk-secret");
        let rendered = format!("{provider:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let provider = ProviderConfig::new("p", "P", "http://localhost:11434/v1/", "llama3.2");
        assert_eq!(
            provider.chat_completions_url(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn ollama_key_skips_bearer_auth() {
        let provider =
            ProviderConfig::new("o", "O", "http://localhost:11434/v1", "llama3.2").with_api_key("ollama");
        assert!(!provider.uses_bearer_auth());
        assert!(provider.clone().with_api_key("sk-1").uses_bearer_auth());
    }

    #[test]
    fn validate_rejects_blank_model() {
        let provider = ProviderConfig::new("c", "Custom", "https://example.com/v1", " ");
        assert!(matches!(
            provider.validate(),
            Err(BackendError::Configuration { .. })
        ));
    }

    #[test]
    fn deserializes_editor_settings_shape() {
        let json = r#"{
            "id": "ollama-default",
            "name": "Ollama",
            "apiKey": "ollama",
            "baseURL": "http://localhost:11434/v1",
            "model": "llama3.2",
            "temperature": 0.7,
            "maxTokens": 2048,
            "isDefault": false
        }"#;
        let provider: ProviderConfig = serde_json::from_str(json).expect("deserialize provider");
        assert_eq!(provider.base_url, "http://localhost:11434/v1");
        assert_eq!(provider.effective_max_tokens(), 2048);
    }

    #[test]
    fn templates_include_custom_slot() {
        let templates = ProviderConfig::templates();
        assert!(templates.iter().any(|t| t.id == "custom" && t.base_url.is_empty()));
        assert!(templates.iter().all(|t| t.max_tokens == Some(4096)));
    }
}
