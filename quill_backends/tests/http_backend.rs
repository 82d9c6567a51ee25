use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;
use quill_backend_api::{ChatBackend, ChatMessage, ErrorKind, ProviderConfig};
use quill_backends::{OpenAiBackend, ProxyBackend};

struct CapturedRequest {
    request_line: String,
    headers: Vec<String>,
    body: String,
}

/// Serves exactly one HTTP exchange and reports what it received.
fn one_shot_server(
    status: &'static str,
    body: &'static str,
    delay: Duration,
) -> (String, mpsc::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake server");
    let address = listener.local_addr().expect("local address");
    let (sender, receiver) = mpsc::channel();

    thread::spawn(move || {
        let Ok((stream, _)) = listener.accept() else {
            return;
        };
        let captured = read_request(&stream);
        let _ = sender.send(captured);
        thread::sleep(delay);
        let mut stream = stream;
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
    });

    (format!("http://{address}/v1"), receiver)
}

fn read_request(stream: &TcpStream) -> CapturedRequest {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("header line");
        let line = line.trim_end().to_owned();
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
            content_length = value.trim().parse().expect("numeric content length");
        }
        headers.push(line);
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).expect("request body");
    CapturedRequest {
        request_line: request_line.trim_end().to_owned(),
        headers,
        body: String::from_utf8(body).expect("utf-8 body"),
    }
}

fn provider(base_url: &str, api_key: &str) -> ProviderConfig {
    ProviderConfig::new("test", "Test", base_url, "test-model").with_api_key(api_key)
}

#[test]
fn direct_backend_posts_chat_completion() {
    let (base_url, requests) = one_shot_server(
        "200 OK",
        r#"{"choices":[{"message":{"role":"assistant","content":"The swift fox jumps."}}],"usage":{"prompt_tokens":20,"completion_tokens":5,"total_tokens":25}}"#,
        Duration::ZERO,
    );
    let backend = OpenAiBackend::new(provider(&base_url, "sk-test"), Duration::from_secs(5))
        .expect("backend builds");

    let response = backend
        .complete(&[ChatMessage::system("be terse"), ChatMessage::user("polish")])
        .expect("successful completion");
    assert_eq!(response.content, "The swift fox jumps.");
    assert_eq!(response.usage.map(|u| u.prompt_tokens), Some(20));

    let captured = requests.recv().expect("request captured");
    assert_eq!(captured.request_line, "POST /v1/chat/completions HTTP/1.1");
    assert!(captured
        .headers
        .iter()
        .any(|h| h.eq_ignore_ascii_case("authorization: Bearer sk-test")));
    let body: serde_json::Value = serde_json::from_str(&captured.body).expect("json body");
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["messages"][1]["content"], "polish");
}

#[test]
fn ollama_key_sends_no_authorization() {
    let (base_url, requests) = one_shot_server(
        "200 OK",
        r#"{"choices":[{"message":{"content":"ok"}}]}"#,
        Duration::ZERO,
    );
    let backend = OpenAiBackend::new(provider(&base_url, "ollama"), Duration::from_secs(5))
        .expect("backend builds");
    backend
        .complete(&[ChatMessage::user("hi")])
        .expect("successful completion");

    let captured = requests.recv().expect("request captured");
    assert!(!captured
        .headers
        .iter()
        .any(|h| h.to_ascii_lowercase().starts_with("authorization:")));
}

#[test]
fn reasoning_tags_are_stripped() {
    let (base_url, _requests) = one_shot_server(
        "200 OK",
        r#"{"choices":[{"message":{"content":"<think>which synonym?</think>\n\n\n\nswift"}}]}"#,
        Duration::ZERO,
    );
    let backend = ProxyBackend::new(provider(&base_url, ""), None, Duration::from_secs(5))
        .expect("backend builds");
    let response = backend
        .complete(&[ChatMessage::user("quick")])
        .expect("successful completion");
    assert_eq!(response.content, "swift");
}

#[test]
fn http_status_is_classified() {
    let cases = [
        ("401 Unauthorized", r#"{"error":"bad key"}"#, ErrorKind::Auth),
        ("429 Too Many Requests", r#"{"error":"slow down"}"#, ErrorKind::RateLimit),
        ("503 Service Unavailable", r#"{"error":"overloaded"}"#, ErrorKind::Provider),
        ("404 Not Found", r#"{"error":"model not found"}"#, ErrorKind::Model),
    ];
    for (status, body, expected) in cases {
        let (base_url, _requests) = one_shot_server(status, body, Duration::ZERO);
        let backend = OpenAiBackend::new(provider(&base_url, "sk"), Duration::from_secs(5))
            .expect("backend builds");
        let err = backend
            .complete(&[ChatMessage::user("hi")])
            .expect_err("error status");
        assert_eq!(err.kind(), expected, "status {status}");
    }
}

#[test]
fn slow_server_is_a_timeout_not_a_network_error() {
    let (base_url, _requests) = one_shot_server(
        "200 OK",
        r#"{"choices":[{"message":{"content":"late"}}]}"#,
        Duration::from_secs(3),
    );
    let backend = OpenAiBackend::new(provider(&base_url, "sk"), Duration::from_millis(300))
        .expect("backend builds");
    let err = backend
        .complete(&[ChatMessage::user("hi")])
        .expect_err("timed out");
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[test]
fn refused_connection_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("address");
    drop(listener);

    let backend = OpenAiBackend::new(
        provider(&format!("http://{address}/v1"), "sk"),
        Duration::from_secs(2),
    )
    .expect("backend builds");
    assert!(!backend.test_connection());
    let err = backend
        .complete(&[ChatMessage::user("hi")])
        .expect_err("nothing listening");
    assert_eq!(err.kind(), ErrorKind::Network);
}
