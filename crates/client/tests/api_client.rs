//! Integration tests for `ApiClient` against a loopback HTTP server.
//!
//! Each test binds an ephemeral port, serves one canned response, and
//! asserts on how the client decodes or classifies it. No external
//! services are involved.

use assert_matches::assert_matches;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crewdeck_client::{ApiClient, ApiError};
use crewdeck_core::status::RunState;

/// Serve a single canned HTTP response on a fresh loopback port and
/// return the base URL to reach it.
async fn serve_response(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        // Drain the request headers so the client sees a well-behaved
        // peer before the response goes out.
        let mut buf = vec![0u8; 4096];
        let mut read = 0;
        loop {
            let n = stream.read(&mut buf[read..]).await.unwrap();
            if n == 0 {
                break;
            }
            read += n;
            if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len(),
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn run_status_parses_the_status_record() {
    let base = serve_response(
        "200 OK",
        r#"{"id":"run-123","status":"COMPLETED","output":"Report ready","created_at":"2026-08-07T10:00:00Z","completed_at":"2026-08-07T10:05:00Z"}"#,
    )
    .await;

    let client = ApiClient::new(base).with_token("test-token");
    let status = client.run_status("run-123").await.unwrap();

    assert_eq!(status.id, "run-123");
    assert_eq!(status.state, RunState::Completed);
    assert_eq!(status.output.as_deref(), Some("Report ready"));
}

#[tokio::test]
async fn expired_session_surfaces_as_unauthorized() {
    let base = serve_response("401 Unauthorized", r#"{"detail":"Not authenticated"}"#).await;

    let client = ApiClient::new(base);
    let err = client.run_status("run-123").await.unwrap_err();

    assert_matches!(err, ApiError::Unauthorized { status: 401 });
}

#[tokio::test]
async fn server_failure_surfaces_status_and_body() {
    let base = serve_response("500 Internal Server Error", "boom").await;

    let client = ApiClient::new(base);
    let err = client.run_status("run-123").await.unwrap_err();

    assert_matches!(err, ApiError::Api { status: 500, body } if body == "boom");
}
