use crate::error::{DeliveryError, Result};
use crate::models::{LifecycleEvent, LogDocument, RunContext};
use crate::services::document_builder::{DocumentBuilder, duration_seconds};
use crate::sink::DocumentSink;
use chrono::{DateTime, Utc};

/// Pipeline for a single run: builds one document per event and hands it to the sink.
///
/// Delivery is best-effort. A failed send is logged and the document dropped; it
/// never surfaces to the caller.
pub struct RelayService<S> {
    sink: S,
    builder: DocumentBuilder,
    host_identity: String,
    context: Option<RunContext>,
}

impl<S: DocumentSink> RelayService<S> {
    pub fn new(sink: S, log_task_results: bool, host_identity: impl Into<String>) -> Self {
        Self {
            sink,
            builder: DocumentBuilder::new(log_task_results),
            host_identity: host_identity.into(),
            context: None,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn start(&mut self, run_name: &str) -> &RunContext {
        self.start_at(run_name, Utc::now())
    }

    pub fn start_at(&mut self, run_name: &str, now: DateTime<Utc>) -> &RunContext {
        if let Some(previous) = &self.context {
            tracing::debug!("Replacing run context {}", previous.run_id);
        }
        self.context
            .insert(RunContext::start(run_name, &self.host_identity, now))
    }

    pub async fn dispatch(&self, event: LifecycleEvent) -> Result<()> {
        self.dispatch_at(event, Utc::now()).await
    }

    /// Fails only when no run has been started.
    pub async fn dispatch_at(&self, event: LifecycleEvent, now: DateTime<Utc>) -> Result<()> {
        let document = self.builder.build(self.context.as_ref(), &event, now)?;
        self.deliver(&document).await;
        self.announce(&event, now);
        Ok(())
    }

    async fn deliver(&self, document: &LogDocument) {
        match self.sink.send(document).await {
            Ok(()) => {
                tracing::trace!("Delivered {:?} document", document.event_type());
            }
            Err(DeliveryError::Status(code)) => {
                tracing::warn!("[Elasticsearch] Failed to send log: HTTP {}", code);
            }
            Err(err) => {
                tracing::warn!("[Elasticsearch] Error: {}", err);
            }
        }
    }

    fn announce(&self, event: &LifecycleEvent, now: DateTime<Utc>) {
        match event {
            LifecycleEvent::RunStart => {
                if let Some(ctx) = &self.context {
                    tracing::info!("[Elasticsearch] Playbook started: {}", ctx.run_name);
                }
            }
            LifecycleEvent::StepFailed { step_name, .. } => {
                tracing::warn!("[Elasticsearch] Task failed: {}", step_name);
            }
            LifecycleEvent::HostUnreachable { host, .. } => {
                tracing::error!("[Elasticsearch] Host unreachable: {}", host);
            }
            LifecycleEvent::RunStats { .. } => {
                if let Some(ctx) = &self.context {
                    tracing::info!(
                        "[Elasticsearch] Playbook completed in {:.2}s",
                        duration_seconds(ctx.start_time, now)
                    );
                }
            }
            _ => {}
        }
    }
}
