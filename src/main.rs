use elk_relay::config::{Config, host_identity};
use elk_relay::{ElasticsearchSink, RelayService, feed};
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "elk_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::debug!("Starting elk_relay with config: {:?}", config);

    let sink = ElasticsearchSink::new(&config);
    let mut service = RelayService::new(sink, config.log_task_results, host_identity());

    let summary = feed(BufReader::new(tokio::io::stdin()), &mut service).await?;
    tracing::debug!(
        "Event stream closed: {} dispatched, {} skipped",
        summary.dispatched,
        summary.skipped
    );

    Ok(())
}
