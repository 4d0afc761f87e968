//! Fraud Scoring Service - Main Entry Point
//!
//! Consumes transaction events from NATS, scores them with the active model
//! artifact, and republishes results. Runs an HTTP control plane for model
//! reload and asynchronous retraining alongside the scoring loop.

use anyhow::Result;
use fraud_scoring_service::{
    config::AppConfig,
    consumer::EventConsumer,
    http::{self, AppState},
    metrics::{MetricsReporter, PipelineMetrics},
    pipeline::ScoringPipeline,
    producer::ResultProducer,
    state::ServiceState,
    trainer::{CommandTrainer, Trainer},
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fraud_scoring_service=info".parse()?),
        )
        .init();

    info!("Starting fraud scoring service");

    // Load configuration
    let config = AppConfig::load()?;
    info!(
        input_subject = %config.nats.input_subject,
        output_subject = %config.nats.output_subject,
        gate = %config.pipeline.rule_band_gate,
        "Configuration loaded"
    );

    // Initial artifact load is fatal: without a model there is no valid
    // state to serve in
    let state = Arc::new(ServiceState::load(Path::new(&config.model.path))?);
    info!(
        model_version = %state.snapshot().model_version,
        path = %config.model.path,
        "Model artifact loaded"
    );

    let metrics = Arc::new(PipelineMetrics::new());

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!(url = %config.nats.url, "Connected to NATS");

    let consumer = EventConsumer::new(
        client.clone(),
        &config.nats.input_subject,
        &config.nats.queue_group,
    );
    let producer = Arc::new(ResultProducer::new(client.clone(), &config.nats.output_subject));

    let trainer: Arc<dyn Trainer> = Arc::new(CommandTrainer::new(
        config.training.command.clone(),
        config.training.args.clone(),
    ));

    // Control plane; a bind failure aborts startup
    let control_plane = tokio::spawn(http::serve(
        AppState {
            state: state.clone(),
            trainer,
        },
        config.http.port,
    ));

    // Drive buffered publishes out periodically
    let flush_producer = producer.clone();
    let flush_interval = Duration::from_millis(config.pipeline.flush_interval_ms);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(flush_interval);
        loop {
            interval.tick().await;
            if let Err(e) = flush_producer.flush().await {
                warn!(error = %e, "Producer flush failed");
            }
        }
    });

    // Metrics reporter
    let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.report_interval_secs);
    tokio::spawn(reporter.start());

    // Scoring loop
    let subscription = consumer.subscribe().await?;
    let pipeline = ScoringPipeline::new(
        state,
        producer.clone(),
        metrics.clone(),
        &config.pipeline,
    );

    tokio::select! {
        _ = pipeline.run(subscription) => {
            warn!("Scoring loop ended");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        result = control_plane => {
            match result {
                Ok(Ok(())) => warn!("Control plane stopped"),
                Ok(Err(e)) => return Err(e),
                Err(e) => return Err(e.into()),
            }
        }
    }

    // Best-effort final flush so scored results are not stranded in the
    // producer buffer
    if let Err(e) = producer.flush().await {
        warn!(error = %e, "Final flush failed");
    }

    info!("Fraud scoring service shutting down");
    metrics.print_summary();

    Ok(())
}
