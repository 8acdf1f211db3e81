use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quarry_core::{
    identity, CommandChannel, JobSource, JsonJobFactory, StatusChannel, TrackerClient,
    WorkerConfig, WorkerRuntime,
};
use quarry_worker::ExecutorRegistry;

use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout belongs to the status frame protocol; logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quarry_core=info,quarry_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = WorkerConfig::from_env();
    config.validate().context("invalid worker configuration")?;
    tracing::info!(job_type = %config.job_type, "quarry worker starting");

    let registry = ExecutorRegistry::with_defaults();
    let executor = registry.create(&config.job_type)?;
    let factory = Arc::new(JsonJobFactory);

    let source = match &config.single_job_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "single-job mode, tracker bypassed");
            JobSource::single_file(path.clone(), factory)
        }
        None => {
            let addr = config.tracker_addr.clone().unwrap_or_default();
            let mut client = TrackerClient::connect(&addr, config.foreman_addr.as_deref())
                .await
                .context("could not reach the tracker")?;

            let patch = client
                .hello(identity::vpid(), &config.job_type)
                .await
                .context("tracker registration failed")?;
            config.apply_patch(&patch);

            // the hello reply may carry a revised checkout endpoint
            if config.tracker_addr.as_deref() != Some(addr.as_str()) {
                let revised = config.tracker_addr.clone().unwrap_or_default();
                tracing::info!(%revised, "tracker endpoint revised by hello reply");
                client.shutdown().await;
                client = TrackerClient::connect(&revised, config.foreman_addr.as_deref())
                    .await
                    .context("could not reach the revised tracker endpoint")?;
            }

            JobSource::tracker(client, identity::vpid(), config.job_type.clone(), factory)
        }
    };

    let status = StatusChannel::stdout();
    let commands = CommandChannel::stdin();

    let mut runtime = WorkerRuntime::new(config, source, status, commands, executor);
    runtime.run().await?;

    tracing::info!(jobs = runtime.jobs_processed(), "worker shutdown complete");
    Ok(())
}
