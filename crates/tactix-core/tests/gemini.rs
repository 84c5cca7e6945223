//! Gemini transport tests against a loopback HTTP stub.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tactix_config::ModelConfig;
use tactix_core::{ClientError, GeminiProvider, GenerateRequest, ModelProvider};
use tactix_protocol::PromptSegment;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Request as seen by the stub: lowercased head and raw body.
struct Captured {
    head: String,
    body: String,
}

/// Serve exactly one canned HTTP response and hand back what was received.
async fn serve_once(status_line: &'static str, body: String) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let base_url = format!("http://{}", listener.local_addr().expect("addr"));
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut received = Vec::new();
        let mut chunk = [0_u8; 4096];
        let header_end = loop {
            let read = socket.read(&mut chunk).await.expect("read");
            assert!(read > 0, "connection closed before headers");
            received.extend_from_slice(&chunk[..read]);
            if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&received[..header_end]).to_lowercase();
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while received.len() < header_end + content_length {
            let read = socket.read(&mut chunk).await.expect("read body");
            assert!(read > 0, "connection closed before body");
            received.extend_from_slice(&chunk[..read]);
        }

        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        socket.shutdown().await.ok();
        Captured {
            head,
            body: String::from_utf8_lossy(&received[header_end..]).into_owned(),
        }
    });
    (base_url, handle)
}

fn provider_for(base_url: String) -> GeminiProvider {
    let config = ModelConfig {
        base_url,
        ..ModelConfig::default()
    };
    GeminiProvider::new("secret-key", &config)
}

fn question() -> GenerateRequest {
    GenerateRequest {
        history: Vec::new(),
        message: vec![
            PromptSegment::text("system"),
            PromptSegment::text("この布陣は？"),
        ],
    }
}

#[tokio::test]
async fn posts_to_model_endpoint_with_key_header() {
    let reply = json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": "4-3-3です" }] } }]
    });
    let (base_url, server) = serve_once("200 OK", reply.to_string()).await;

    let provider = provider_for(base_url);
    let text = provider.generate(&question()).await.expect("generate");
    assert_eq!(text.as_deref(), Some("4-3-3です"));

    let captured = server.await.expect("stub");
    let request_line = captured.head.lines().next().expect("request line");
    assert_eq!(
        request_line,
        "post /v1/models/gemini-2.5-flash:generatecontent http/1.1"
    );
    assert!(
        captured
            .head
            .lines()
            .any(|line| line.trim() == "x-goog-api-key: secret-key")
    );
    let sent: Value = serde_json::from_str(&captured.body).expect("json body");
    assert_eq!(
        sent,
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": "system" }, { "text": "この布陣は？" }]
            }]
        })
    );
}

#[tokio::test]
async fn error_status_becomes_upstream_error() {
    let body = json!({
        "error": { "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" }
    });
    let (base_url, server) = serve_once("403 Forbidden", body.to_string()).await;

    let err = provider_for(base_url)
        .generate(&question())
        .await
        .expect_err("failure");
    assert_eq!(
        err,
        ClientError::Upstream(
            "gemini request failed (403 PERMISSION_DENIED): API key not valid".to_string()
        )
    );
    server.await.expect("stub");
}

#[tokio::test]
async fn refused_connection_becomes_upstream_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let base_url = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);

    let err = provider_for(base_url)
        .generate(&question())
        .await
        .expect_err("failure");
    match err {
        ClientError::Upstream(message) => {
            assert!(message.starts_with("gemini request failed:"), "{message}")
        }
        other => panic!("unexpected error {other:?}"),
    }
}
