use std::sync::Arc;

use quill_backend_api::{
    BackendCapabilities, BackendRegistry, BackendResult, BackendSummary, ChatBackend, ChatMessage,
    ChatResponse, ProgressSink,
};
use quill_backends::TransportSelector;
use tracing::{debug, warn};

use crate::settings::Settings;
use crate::{Error, Result};

/// High-level façade for invoking chat backends by id.
#[derive(Clone)]
pub struct BackendService {
    registry: Arc<BackendRegistry>,
}

impl BackendService {
    /// Create a service backed by the provided registry.
    #[must_use]
    pub fn new(registry: BackendRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Build one backend per configured provider, using the transport the
    /// selector picks and the settings' request timeout.
    #[must_use]
    pub fn from_settings(settings: &Settings, selector: &TransportSelector) -> Self {
        Self::new(quill_backends::default_registry(
            &settings.providers,
            selector,
            settings.request_timeout(),
        ))
    }

    /// Access the underlying registry.
    #[must_use]
    pub fn registry(&self) -> Arc<BackendRegistry> {
        Arc::clone(&self.registry)
    }

    /// Summaries for all registered backends.
    #[must_use]
    pub fn summaries(&self) -> Vec<BackendSummary> {
        self.registry.summaries()
    }

    /// Capabilities for a backend, if registered.
    #[must_use]
    pub fn capabilities(&self, backend_id: &str) -> Option<BackendCapabilities> {
        self.registry.capabilities(backend_id)
    }

    /// Registered backend ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.registry
            .ids()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Whether `backend_id` is registered.
    #[must_use]
    pub fn contains(&self, backend_id: &str) -> bool {
        self.registry.contains(backend_id)
    }

    /// Run a completion on the given backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendNotRegistered`] when the id is unknown, or
    /// wraps the backend's classified failure in [`Error::Backend`].
    pub fn complete(&self, backend_id: &str, messages: &[ChatMessage]) -> Result<ChatResponse> {
        let backend = self.backend(backend_id)?;
        debug!(backend = backend_id, messages = messages.len(), "sending completion");
        Self::invoke(backend_id, backend.complete(messages))
    }

    /// Run a completion while reporting progress to `sink`.
    ///
    /// # Errors
    ///
    /// Same as [`BackendService::complete`].
    pub fn complete_with_progress(
        &self,
        backend_id: &str,
        messages: &[ChatMessage],
        sink: &dyn ProgressSink,
    ) -> Result<ChatResponse> {
        let backend = self.backend(backend_id)?;
        Self::invoke(backend_id, backend.complete_with_progress(messages, sink))
    }

    /// Check a backend with a minimal prompt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendNotRegistered`] when the id is unknown.
    pub fn test_connection(&self, backend_id: &str) -> Result<bool> {
        Ok(self.backend(backend_id)?.test_connection())
    }

    fn backend(&self, backend_id: &str) -> Result<Arc<dyn ChatBackend>> {
        self.registry
            .get(backend_id)
            .ok_or_else(|| Error::BackendNotRegistered {
                backend: backend_id.to_string(),
            })
    }

    fn invoke<T>(backend_id: &str, result: BackendResult<T>) -> Result<T> {
        result.map_err(|source| {
            warn!(backend = backend_id, kind = ?source.kind(), error = %source, "backend request failed");
            Error::Backend {
                backend: backend_id.to_string(),
                source,
            }
        })
    }
}

impl std::fmt::Debug for BackendService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendService")
            .field("backends", &self.registry.ids())
            .finish()
    }
}
