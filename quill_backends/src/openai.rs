use std::time::Duration;

use quill_backend_api::{
    BackendCapabilities, BackendResult, ChatBackend, ChatMessage, ChatResponse, ProviderConfig,
};

use crate::http::{ChatRequest, HttpTransport};

/// Talks to the provider's OpenAI-compatible endpoint directly.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    provider: ProviderConfig,
    transport: HttpTransport,
}

impl OpenAiBackend {
    /// Create a backend for `provider` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the provider lacks a base URL or
    /// model, or when the HTTP client cannot be built.
    pub fn new(provider: ProviderConfig, timeout: Duration) -> BackendResult<Self> {
        provider.validate()?;
        Ok(Self {
            provider,
            transport: HttpTransport::new(timeout)?,
        })
    }

    /// Provider settings backing this backend.
    pub const fn provider(&self) -> &ProviderConfig {
        &self.provider
    }
}

impl ChatBackend for OpenAiBackend {
    fn id(&self) -> &str {
        &self.provider.id
    }

    fn label(&self) -> &str {
        &self.provider.name
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::new(false, 4096)
    }

    fn complete(&self, messages: &[ChatMessage]) -> BackendResult<ChatResponse> {
        let body = ChatRequest::for_provider(&self.provider, messages);
        let bearer = self
            .provider
            .uses_bearer_auth()
            .then_some(self.provider.api_key.as_str());
        self.transport
            .post_chat(&self.provider.chat_completions_url(), bearer, &body)
    }
}
