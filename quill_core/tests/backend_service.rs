use std::sync::{Arc, Mutex};

use quill_backend_api::{
    BackendCapabilities, BackendError, BackendRegistry, BackendResult, ChatBackend, ChatMessage,
    ChatResponse, ProgressSink, ProviderConfig,
};
use quill_backends::{Transport, TransportSelector};
use quill_core::backends::BackendService;
use quill_core::settings::Settings;
use quill_core::Error;

#[derive(Default)]
struct FakeBackend {
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ChatBackend for FakeBackend {
    fn id(&self) -> &str {
        "fake"
    }

    fn label(&self) -> &str {
        "Fake Backend"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::new(false, 8192)
    }

    fn complete(&self, messages: &[ChatMessage]) -> BackendResult<ChatResponse> {
        let prompt = messages
            .last()
            .map(|message| message.content.clone())
            .unwrap_or_default();
        self.prompts.lock().expect("prompts lock").push(prompt.clone());
        if prompt == "fail" {
            return Err(BackendError::RateLimit);
        }
        Ok(ChatResponse::text(prompt.to_uppercase()))
    }
}

#[derive(Default)]
struct RecordingSink {
    chunks: Mutex<Vec<String>>,
    done: Mutex<Vec<Option<String>>>,
}

impl ProgressSink for RecordingSink {
    fn on_chunk(&self, chunk: &str) {
        self.chunks.lock().expect("chunks lock").push(chunk.to_owned());
    }

    fn on_done(&self, error: Option<&BackendError>) {
        self.done
            .lock()
            .expect("done lock")
            .push(error.map(ToString::to_string));
    }
}

fn service() -> (BackendService, Arc<Mutex<Vec<String>>>) {
    let backend = FakeBackend::default();
    let prompts = Arc::clone(&backend.prompts);
    let mut registry = BackendRegistry::new();
    registry.register(backend);
    (BackendService::new(registry), prompts)
}

#[test]
fn backend_service_round_trip() {
    let (service, prompts) = service();

    let summaries = service.summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, "fake");
    assert_eq!(
        service.capabilities("fake").map(|caps| caps.max_context_tokens),
        Some(8192)
    );

    let response = service
        .complete("fake", &[ChatMessage::user("hello")])
        .expect("complete");
    assert_eq!(response.content, "HELLO");
    assert_eq!(prompts.lock().expect("prompts lock").as_slice(), ["hello"]);
    assert!(service.test_connection("fake").expect("connection test"));
    assert_eq!(format!("{service:?}"), "BackendService { backends: [\"fake\"] }");
}

#[test]
fn backend_failures_are_wrapped() {
    let (service, _) = service();
    let err = service
        .complete("fake", &[ChatMessage::user("fail")])
        .expect_err("rate limited");
    match err {
        Error::Backend { backend, source } => {
            assert_eq!(backend, "fake");
            assert_eq!(source, BackendError::RateLimit);
        }
        other => panic!("expected Backend, got {other:?}"),
    }
}

#[test]
fn missing_backend_is_reported() {
    let service = BackendService::new(BackendRegistry::new());
    let err = service
        .complete("missing", &[ChatMessage::user("hi")])
        .expect_err("missing backend");
    assert!(matches!(&err, Error::BackendNotRegistered { backend } if backend == "missing"));
    assert!(!err.is_recoverable());
    assert!(service.test_connection("missing").is_err());
}

#[test]
fn progress_sink_sees_one_done() {
    let (service, _) = service();
    let sink = RecordingSink::default();
    service
        .complete_with_progress("fake", &[ChatMessage::user("abc")], &sink)
        .expect("complete");
    assert_eq!(sink.chunks.lock().expect("chunks lock").as_slice(), ["ABC"]);
    assert_eq!(sink.done.lock().expect("done lock").as_slice(), [None::<String>]);

    let sink = RecordingSink::default();
    let _ = service.complete_with_progress("fake", &[ChatMessage::user("fail")], &sink);
    assert_eq!(sink.done.lock().expect("done lock").len(), 1);
    assert!(sink.done.lock().expect("done lock")[0].is_some());
}

#[test]
fn service_from_settings_registers_valid_providers() {
    let mut settings = Settings::default();
    settings.add_provider(ProviderConfig::new(
        "ollama",
        "Ollama",
        "http://localhost:11434/v1",
        "llama3.2",
    ));
    settings.add_provider(ProviderConfig::new("broken", "Broken", "", ""));
    let selector = TransportSelector::default().with_override(Transport::Direct);

    let service = BackendService::from_settings(&settings, &selector);
    assert_eq!(service.ids(), vec!["ollama".to_owned()]);
    assert!(service.contains("ollama"));
    assert!(!service.contains("broken"));
}
