//! Backend registry keeps track of available AI transports.

use std::collections::HashMap;
use std::sync::Arc;

use super::{BackendCapabilities, BackendSummary, ChatBackend};

/// In-memory registry for chat backends.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn ChatBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend keyed by its `ChatBackend::id`.
    pub fn register<B>(&mut self, backend: B)
    where
        B: ChatBackend + 'static,
    {
        self.register_arc(Arc::new(backend));
    }

    /// Register an already shared backend, replacing any previous entry with the same id.
    pub fn register_arc(&mut self, backend: Arc<dyn ChatBackend>) {
        self.backends.insert(backend.id().to_owned(), backend);
    }

    /// Drop a backend, returning it if it was registered.
    pub fn remove(&mut self, id: &str) -> Option<Arc<dyn ChatBackend>> {
        self.backends.remove(id)
    }

    /// Retrieve a backend by identifier.
    pub fn get(&self, id: &str) -> Option<Arc<dyn ChatBackend>> {
        self.backends.get(id).cloned()
    }

    /// Whether a backend with the identifier is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.backends.contains_key(id)
    }

    /// Returns the registered backend identifiers, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Capabilities for a backend, if registered.
    pub fn capabilities(&self, id: &str) -> Option<BackendCapabilities> {
        self.backends.get(id).map(|backend| backend.capabilities())
    }

    /// Summaries for all registered backends, sorted by id.
    pub fn summaries(&self) -> Vec<BackendSummary> {
        let mut summaries: Vec<BackendSummary> = self
            .backends
            .values()
            .map(|backend| BackendSummary {
                id: backend.id().to_owned(),
                label: backend.label().to_owned(),
                capabilities: backend.capabilities(),
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    /// Number of registered backends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Whether no backend is registered.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
