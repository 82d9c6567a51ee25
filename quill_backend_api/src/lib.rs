mod error;
mod provider;
mod registry;
mod types;

pub use error::{classify_status, BackendError, BackendResult, ErrorKind};
pub use provider::ProviderConfig;
pub use registry::BackendRegistry;
pub use types::{
    BackendCapabilities, BackendSummary, ChatMessage, ChatResponse, ProgressSink, Role, Usage,
};

/// Trait implemented by AI chat transports (direct HTTP, proxied HTTP, test fakes).
///
/// The core only needs eventual delivery of one final text per request; how a
/// backend talks to its vendor is its own business.
pub trait ChatBackend: Send + Sync {
    /// Stable identifier used for lookup and logging.
    fn id(&self) -> &str;

    /// Human-friendly label for UI surfaces.
    fn label(&self) -> &str;

    /// Capabilities advertised by the backend.
    fn capabilities(&self) -> BackendCapabilities;

    /// Run a chat completion and return the final assistant text.
    ///
    /// # Errors
    ///
    /// Implementors classify failures into the [`ErrorKind`] taxonomy so the
    /// UI can tell a timeout from an authentication problem.
    fn complete(&self, messages: &[ChatMessage]) -> BackendResult<ChatResponse>;

    /// Check whether the backend answers a minimal prompt.
    fn test_connection(&self) -> bool {
        self.complete(&[ChatMessage::user("Hello")]).is_ok()
    }

    /// Run a completion while reporting progress to `sink`.
    ///
    /// `on_done` is called exactly once, after any `on_chunk` calls.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`ChatBackend::complete`].
    fn complete_with_progress(
        &self,
        messages: &[ChatMessage],
        sink: &dyn ProgressSink,
    ) -> BackendResult<ChatResponse> {
        let result = self.complete(messages);
        match &result {
            Ok(response) => {
                if !response.content.is_empty() {
                    sink.on_chunk(&response.content);
                }
                sink.on_done(None);
            }
            Err(error) => sink.on_done(Some(error)),
        }
        result
    }
}
