use std::time::Duration;

use quill_backend_api::{
    BackendCapabilities, BackendResult, ChatBackend, ChatMessage, ChatResponse,
    ProgressSink, ProviderConfig,
};

use crate::http::{ChatRequest, HttpTransport};

const CHUNK_CHARS: usize = 3;

/// Sends OpenAI-compatible requests through a relay for hosts that cannot
/// reach the vendor directly (browser or mobile front ends).
///
/// The relay receives the same JSON body and headers the vendor would.
/// Without a relay URL the provider's own base URL is used.
#[derive(Debug, Clone)]
pub struct ProxyBackend {
    provider: ProviderConfig,
    relay_url: Option<String>,
    transport: HttpTransport,
}

impl ProxyBackend {
    /// Create a proxied backend.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an incomplete provider, or when the
    /// HTTP client cannot be built.
    pub fn new(
        provider: ProviderConfig,
        relay_url: Option<String>,
        timeout: Duration,
    ) -> BackendResult<Self> {
        provider.validate()?;
        let relay_url = relay_url.filter(|url| !url.trim().is_empty());
        Ok(Self {
            provider,
            relay_url,
            transport: HttpTransport::new(timeout)?,
        })
    }

    /// Endpoint the request is posted to.
    pub fn endpoint(&self) -> String {
        self.relay_url.as_ref().map_or_else(
            || self.provider.chat_completions_url(),
            |relay| format!("{}/chat/completions", relay.trim_end_matches('/')),
        )
    }
}

impl ChatBackend for ProxyBackend {
    fn id(&self) -> &str {
        &self.provider.id
    }

    fn label(&self) -> &str {
        &self.provider.name
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::new(true, 4096)
    }

    fn complete(&self, messages: &[ChatMessage]) -> BackendResult<ChatResponse> {
        let body = ChatRequest::for_provider(&self.provider, messages);
        let bearer = self
            .provider
            .uses_bearer_auth()
            .then_some(self.provider.api_key.as_str());
        self.transport.post_chat(&self.endpoint(), bearer, &body)
    }

    fn test_connection(&self) -> bool {
        self.complete(&[ChatMessage::user("Hi")]).is_ok()
    }

    /// Replays the final text in small chunks so progress UIs animate.
    fn complete_with_progress(
        &self,
        messages: &[ChatMessage],
        sink: &dyn ProgressSink,
    ) -> BackendResult<ChatResponse> {
        let result = self.complete(messages);
        match &result {
            Ok(response) => {
                for chunk in chunks(&response.content, CHUNK_CHARS) {
                    sink.on_chunk(chunk);
                }
                sink.on_done(None);
            }
            Err(error) => sink.on_done(Some(error)),
        }
        result
    }
}

fn chunks(text: &str, size: usize) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let cut = rest
            .char_indices()
            .nth(size)
            .map_or(rest.len(), |(index, _)| index);
        let (head, tail) = rest.split_at(cut);
        rest = tail;
        Some(head)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_respect_char_boundaries() {
        let pieces: Vec<&str> = chunks("héllo wörld", 3).collect();
        assert_eq!(pieces, vec!["hél", "lo ", "wör", "ld"]);
        assert_eq!(chunks("", 3).count(), 0);
    }

    #[test]
    fn relay_url_overrides_provider_endpoint() {
        let provider = ProviderConfig::new("p", "P", "https://api.openai.com/v1", "gpt");
        let direct = ProxyBackend::new(provider.clone(), None, Duration::from_secs(5))
            .expect("backend builds");
        assert_eq!(direct.endpoint(), "https://api.openai.com/v1/chat/completions");

        let relayed = ProxyBackend::new(
            provider,
            Some("https://relay.example.com/v1/".into()),
            Duration::from_secs(5),
        )
        .expect("backend builds");
        assert_eq!(relayed.endpoint(), "https://relay.example.com/v1/chat/completions");
    }
}
