//! `crewdeck-watch` -- terminal watcher for a single crew run.
//!
//! Opens a run view for the given run identifier: streams live
//! progress events to stdout as they arrive, and prints the
//! authoritative final result once the platform reports the run
//! terminal.
//!
//! # Usage
//!
//! ```text
//! crewdeck-watch <run-id>
//! ```
//!
//! # Environment variables
//!
//! | Variable                      | Required | Default                 | Description                  |
//! |-------------------------------|----------|-------------------------|------------------------------|
//! | `CREWDECK_API_URL`            | no       | `http://localhost:8000` | Platform HTTP base URL       |
//! | `CREWDECK_TOKEN`              | no       | --                      | Bearer token for API calls   |
//! | `CREWDECK_POLL_INTERVAL_SECS` | no       | `5`                     | Status polling cadence       |

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crewdeck_client::ApiClient;
use crewdeck_watch::config::WatchConfig;
use crewdeck_watch::{ResultPane, RunView, StatusSource, ViewConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crewdeck_watch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let run_id = std::env::args().nth(1).unwrap_or_else(|| {
        tracing::error!("usage: crewdeck-watch <run-id>");
        std::process::exit(2);
    });

    let config = WatchConfig::from_env();

    let mut api = ApiClient::new(config.api_base.clone());
    if let Some(token) = &config.token {
        api = api.with_token(token);
    }
    let ws_base = api.ws_base();
    let source: Arc<dyn StatusSource> = Arc::new(api);

    tracing::info!(run_id = %run_id, api = %config.api_base, "Watching run");

    let mut view_config = ViewConfig::new(ws_base);
    view_config.poll_interval = config.poll_interval;
    let view = RunView::open(run_id, source, view_config);

    let mut timeline_rx = view.subscribe_timeline();
    let mut printed = 0usize;
    let mut warned_auth = false;

    loop {
        let snapshot = view.snapshot().await;

        for line in &snapshot.timeline[printed..] {
            println!("{line}");
        }
        printed = snapshot.timeline.len();

        if snapshot.auth_required && !warned_auth {
            warned_auth = true;
            tracing::warn!("Status polls are being rejected -- re-authenticate and restart");
        }

        if snapshot.result.is_terminal() {
            break;
        }

        tokio::select! {
            _ = timeline_rx.changed() => {}
            _ = tokio::time::sleep(Duration::from_millis(500)) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, closing run view");
                break;
            }
        }
    }

    view.close().await;

    // Flush anything appended during teardown (e.g. the close notice),
    // then show the final verdict.
    let snapshot = view.snapshot().await;
    for line in &snapshot.timeline[printed..] {
        println!("{line}");
    }

    match snapshot.result {
        ResultPane::Pending => println!("\nrun is still in progress"),
        ResultPane::Output(output) => println!("\n--- final result ---\n{output}"),
        ResultPane::Failed { detail } => {
            println!("\nrun failed");
            if let Some(detail) = detail {
                println!("{detail}");
            }
        }
    }
}
