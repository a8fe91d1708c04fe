use std::io::{ErrorKind, Write};

use super::{Message, NotificationSink, SinkError, slack};

/// Dry-run sink: prints each webhook payload as one JSON document.
#[derive(Debug, Default)]
pub struct StdoutSink;

fn write_payload(out: &mut impl Write, message: &Message) -> Result<(), SinkError> {
    let json = serde_json::to_string_pretty(&slack::payload(message))?;
    match writeln!(out, "{json}") {
        // reader went away, e.g. `| head`
        Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(()),
        other => Ok(other?),
    }
}

impl NotificationSink for StdoutSink {
    async fn send(&self, message: &Message) -> Result<(), SinkError> {
        write_payload(&mut std::io::stdout().lock(), message)
    }
}
