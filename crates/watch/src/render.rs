//! Display formatting for timeline entries.
//!
//! Every event renders to one line, whatever its payload looks like:
//! missing fields get placeholders, unknown kinds are shown with their
//! raw kind name. Rendering never fails.

use crewdeck_stream::{EventKind, ProgressEvent};

/// One rendered timeline line: receipt-time label plus description.
pub fn timeline_line(event: &ProgressEvent) -> String {
    format!("[{}] {}", event.received_at.format("%H:%M:%S"), describe(event))
}

/// Human-readable description of an event, placeholders included.
pub fn describe(event: &ProgressEvent) -> String {
    let p = &event.payload;
    match &event.kind {
        EventKind::AgentStarted => format!(
            "{} started: {}",
            text_or(&p.agent, "unknown agent"),
            text_or(&p.message, "(no detail)"),
        ),
        EventKind::AgentActing => format!(
            "{}: {}",
            text_or(&p.agent, "unknown agent"),
            text_or(&p.message, "(no detail)"),
        ),
        EventKind::ToolStarted => format!(
            "using {}: {}",
            text_or(&p.tool, "unknown tool"),
            text_or(&p.input, "(no input)"),
        ),
        EventKind::ToolFinished => format!(
            "{} finished: {}",
            text_or(&p.tool, "unknown tool"),
            text_or(&p.output, "(no output)"),
        ),
        EventKind::OutputChunk => text_or(&p.content, "(empty chunk)").to_string(),
        EventKind::Completed => match &p.message {
            Some(message) => format!("run completed: {message}"),
            None => "run completed".to_string(),
        },
        EventKind::Failed => format!("run failed: {}", text_or(&p.error, "(no error detail)")),
        EventKind::ConnectionNotice => {
            let message = text_or(&p.message, "connection notice");
            match &p.error {
                Some(error) => format!("{message} ({error})"),
                None => message.to_string(),
            }
        }
        EventKind::Other(kind) => format!(
            "[{kind}] {}",
            text_or(&p.message, "(unrecognized event)"),
        ),
    }
}

fn text_or<'a>(field: &'a Option<String>, placeholder: &'a str) -> &'a str {
    field.as_deref().unwrap_or(placeholder)
}
