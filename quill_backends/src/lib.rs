mod environment;
pub mod filter;
mod http;
mod openai;
mod proxy;

use std::env;
use std::time::Duration;

pub use environment::{Environment, Transport, TransportSelector, PROXY_URL_ENV};
pub use http::{HttpTransport, DEFAULT_TIMEOUT};
pub use openai::OpenAiBackend;
pub use proxy::ProxyBackend;

use quill_backend_api::{BackendRegistry, BackendResult, ChatBackend, ProviderConfig};
use tracing::warn;

/// Build the backend variant for `provider` over `transport`.
///
/// # Errors
///
/// Returns a configuration error when the provider is incomplete.
pub fn backend_for(
    provider: &ProviderConfig,
    transport: Transport,
    timeout: Duration,
) -> BackendResult<Box<dyn ChatBackend>> {
    Ok(match transport {
        Transport::Direct => Box::new(OpenAiBackend::new(provider.clone(), timeout)?),
        Transport::Proxied => Box::new(ProxyBackend::new(
            provider.clone(),
            env::var(PROXY_URL_ENV).ok(),
            timeout,
        )?),
    })
}

/// Build a backend registry with one entry per usable provider.
///
/// Providers that fail validation are skipped with a warning.
#[must_use]
pub fn default_registry(
    providers: &[ProviderConfig],
    selector: &TransportSelector,
    timeout: Duration,
) -> BackendRegistry {
    let transport = selector.transport();
    let mut registry = BackendRegistry::new();
    for provider in providers {
        match backend_for(provider, transport, timeout) {
            Ok(backend) => registry.register_arc(backend.into()),
            Err(err) => warn!(provider = %provider.id, error = %err, "skipping provider"),
        }
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_skips_incomplete_providers() {
        let providers = vec![
            ProviderConfig::new("ollama", "Ollama", "http://localhost:11434/v1", "llama3.2"),
            ProviderConfig::new("custom", "Custom", "", ""),
        ];
        let selector = TransportSelector::default().with_override(Transport::Direct);
        let registry = default_registry(&providers, &selector, DEFAULT_TIMEOUT);
        assert_eq!(registry.ids(), vec!["ollama"]);
    }

    #[test]
    fn proxied_backend_advertises_progress() {
        let provider = ProviderConfig::new("p", "Provider", "https://api.example.com/v1", "m");
        let backend =
            backend_for(&provider, Transport::Proxied, DEFAULT_TIMEOUT).expect("valid provider");
        assert!(backend.capabilities().supports_streaming);
        assert_eq!(backend.label(), "Provider");
    }
}
