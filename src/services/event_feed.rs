use crate::dto::InboundEvent;
use crate::models::LifecycleEvent;
use crate::services::RelayService;
use crate::sink::DocumentSink;
use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// What happened to the lines of one event stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedSummary {
    pub dispatched: usize,
    pub skipped: usize,
}

/// Reads newline-delimited events until EOF and dispatches each one.
///
/// Blank lines are ignored. Lines that do not parse, or that arrive before a
/// run has started, are logged and skipped.
pub async fn feed<R, S>(reader: R, service: &mut RelayService<S>) -> Result<FeedSummary>
where
    R: AsyncBufRead + Unpin,
    S: DocumentSink,
{
    let mut lines = reader.lines();
    let mut summary = FeedSummary::default();
    let mut line_no = 0usize;

    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read event stream")?
    {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let inbound = match InboundEvent::parse(line) {
            Ok(inbound) => inbound,
            Err(e) => {
                tracing::warn!("Skipping line {}: {}", line_no, e);
                summary.skipped += 1;
                continue;
            }
        };

        if let Some(run_name) = inbound.run_name() {
            let ctx = service.start(run_name);
            tracing::debug!("Run {} started", ctx.run_id);
        }

        match service.dispatch(LifecycleEvent::from(inbound)).await {
            Ok(()) => summary.dispatched += 1,
            Err(e) => {
                tracing::error!("Dropping line {}: {}", line_no, e);
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}
