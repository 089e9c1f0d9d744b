//! End-to-end scenarios for `RunView`: a loopback WebSocket stream on
//! one side, a canned status source on the other, reconciled at
//! snapshot time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::SinkExt;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use crewdeck_client::ApiError;
use crewdeck_core::status::{RunState, RunStatus};
use crewdeck_stream::ConnectionHealth;
use crewdeck_watch::{ResultPane, RunView, StatusSource, ViewConfig};

fn status(state: RunState, output: Option<&str>) -> RunStatus {
    RunStatus {
        id: "run-123".to_string(),
        state,
        output: output.map(str::to_string),
        created_at: Utc::now(),
        completed_at: state.is_terminal().then(Utc::now),
    }
}

/// Always answers with the same status record.
struct FixedSource(RunStatus);

#[async_trait]
impl StatusSource for FixedSource {
    async fn fetch_status(&self, _run_id: &str) -> Result<RunStatus, ApiError> {
        Ok(self.0.clone())
    }
}

/// Never answers at all.
struct SilentSource;

#[async_trait]
impl StatusSource for SilentSource {
    async fn fetch_status(&self, _run_id: &str) -> Result<RunStatus, ApiError> {
        std::future::pending().await
    }
}

/// Serve one WebSocket session: send the frames, then close.
async fn serve_stream(frames: Vec<&'static str>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        for frame in frames {
            ws.send(Message::Text(frame.to_string())).await.unwrap();
        }
        ws.close(None).await.ok();
    });

    format!("ws://{addr}")
}

fn fast_config(ws_base: String) -> ViewConfig {
    let mut config = ViewConfig::new(ws_base);
    config.poll_interval = Duration::from_millis(10);
    config
}

/// Poll-wait with a timeout until `cond` holds.
async fn eventually<F, Fut>(cond: F)
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition should hold before the timeout");
}

#[tokio::test]
async fn completed_run_shows_timeline_and_final_result() {
    let ws_base = serve_stream(vec![
        r#"{"kind":"agent_started","agent":"Researcher","message":"beginning"}"#,
    ])
    .await;
    let source = Arc::new(FixedSource(status(RunState::Completed, Some("Report ready"))));

    let view = RunView::open("run-123".to_string(), source, fast_config(ws_base));

    eventually(|| async {
        let snapshot = view.snapshot().await;
        snapshot.result.is_terminal() && snapshot.health == ConnectionHealth::Closed
    })
    .await;

    let snapshot = view.snapshot().await;
    assert_eq!(snapshot.timeline.len(), 3);
    assert!(snapshot.timeline[0].contains("stream active"));
    assert!(snapshot.timeline[1].contains("Researcher"));
    assert!(snapshot.timeline[2].contains("stream closed"));
    assert_eq!(snapshot.result, ResultPane::Output("Report ready".to_string()));

    // The copy action is a pure read: same answer twice, no state change.
    assert_eq!(view.output().await.as_deref(), Some("Report ready"));
    assert_eq!(view.output().await.as_deref(), Some("Report ready"));
    assert_eq!(view.snapshot().await.timeline.len(), 3);

    view.close().await;
}

#[tokio::test]
async fn unknown_stream_kind_renders_generically_and_leaves_status_alone() {
    let ws_base = serve_stream(vec![r#"{"kind":"unknown_kind_xyz"}"#]).await;
    let source = Arc::new(FixedSource(status(RunState::Running, None)));

    let view = RunView::open("run-123".to_string(), source, fast_config(ws_base));

    eventually(|| async { view.snapshot().await.health == ConnectionHealth::Closed }).await;

    let snapshot = view.snapshot().await;
    assert!(snapshot.timeline.iter().any(|line| line.contains("unknown_kind_xyz")));
    assert_eq!(snapshot.result, ResultPane::Pending);
    assert!(!snapshot.stream_reports_terminal);

    view.close().await;
}

#[tokio::test]
async fn stream_terminal_claim_stays_advisory() {
    // The stream says "completed" but the authoritative status is
    // still Running: the result pane must stay pending.
    let ws_base = serve_stream(vec![r#"{"kind":"completed"}"#]).await;
    let source = Arc::new(FixedSource(status(RunState::Running, None)));

    let view = RunView::open("run-123".to_string(), source, fast_config(ws_base));

    eventually(|| async { view.snapshot().await.stream_reports_terminal }).await;

    let snapshot = view.snapshot().await;
    assert!(snapshot.stream_reports_terminal);
    assert_eq!(snapshot.result, ResultPane::Pending);

    view.close().await;
}

#[tokio::test]
async fn failed_run_shows_the_failure_affordance() {
    let ws_base = serve_stream(vec![r#"{"kind":"failed","error":"out of credits"}"#]).await;
    let source = Arc::new(FixedSource(status(RunState::Failed, Some("partial notes"))));

    let view = RunView::open("run-123".to_string(), source, fast_config(ws_base));

    eventually(|| async { view.snapshot().await.result.is_terminal() }).await;

    let snapshot = view.snapshot().await;
    assert_eq!(
        snapshot.result,
        ResultPane::Failed {
            detail: Some("partial notes".to_string())
        }
    );

    view.close().await;
}

#[tokio::test]
async fn closing_immediately_tears_down_both_subsystems() {
    // Unreachable stream endpoint, silent status source: nothing ever
    // arrives, and closing right away must still be clean.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let view = RunView::open(
        "run-123".to_string(),
        Arc::new(SilentSource),
        fast_config(format!("ws://{addr}")),
    );

    view.close().await;
    view.close().await; // idempotent on every exit path

    let snapshot = view.snapshot().await;
    assert_eq!(snapshot.health, ConnectionHealth::Closed);
    assert_eq!(snapshot.result, ResultPane::Pending);
    assert!(view.output().await.is_none());

    drop(listener);
}
