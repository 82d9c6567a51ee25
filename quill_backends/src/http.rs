//! Blocking HTTP transport for OpenAI-compatible chat completion endpoints.

use std::time::Duration;

use quill_backend_api::{
    classify_status, BackendError, BackendResult, ChatMessage, ChatResponse, ProviderConfig, Usage,
};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::filter::strip_reasoning;

/// Default overall request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

impl<'a> ChatRequest<'a> {
    pub(crate) fn for_provider(provider: &'a ProviderConfig, messages: &'a [ChatMessage]) -> Self {
        Self {
            model: &provider.model,
            messages,
            temperature: provider.effective_temperature(),
            max_tokens: provider.effective_max_tokens(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

/// Shared HTTP client with a caller-visible timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport whose requests fail with [`BackendError::Timeout`] after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Configuration`] when the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> BackendResult<Self> {
        let client = Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .timeout(timeout)
            .build()
            .map_err(|err| BackendError::configuration(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, timeout })
    }

    /// Timeout applied to every request.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST a chat completion request and normalize the answer.
    pub(crate) fn post_chat(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &ChatRequest<'_>,
    ) -> BackendResult<ChatResponse> {
        debug!(url, model = body.model, messages = body.messages.len(), "sending chat completion");

        let mut request = self.client.post(url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|err| self.map_transport_error(&err))?;
        let status = response.status();
        let text = response.text().map_err(|err| self.map_transport_error(&err))?;

        if !status.is_success() {
            let error = classify_status(status.as_u16(), &text);
            warn!(url, status = status.as_u16(), kind = ?error.kind(), "chat completion failed");
            return Err(error);
        }

        parse_completion(&text)
    }

    fn map_transport_error(&self, err: &reqwest::Error) -> BackendError {
        if err.is_timeout() {
            warn!(timeout_secs = self.timeout.as_secs(), "chat completion timed out");
            BackendError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            warn!(error = %err, "chat completion transport error");
            BackendError::network(err.to_string())
        }
    }
}

/// Parse an OpenAI-compatible response body into a filtered [`ChatResponse`].
pub(crate) fn parse_completion(body: &str) -> BackendResult<ChatResponse> {
    let wire: WireResponse = serde_json::from_str(body).map_err(|err| BackendError::Provider {
        status: 200,
        message: format!("unparseable response: {err}"),
    })?;

    let raw = wire
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();
    let content = strip_reasoning(&raw);
    if content.is_empty() {
        return Err(BackendError::EmptyResponse);
    }

    Ok(ChatResponse {
        content,
        usage: wire.usage.map(|usage| Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }),
    })
}
