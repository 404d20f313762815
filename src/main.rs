//! Fraud Risk Engine - Main Entry Point
//!
//! Consumes transactions and transaction batches from NATS, runs rule-based and
//! narrative risk analysis, replies with the verdicts and publishes review alerts.

use anyhow::{Context, Result};
use async_nats::Message;
use fraud_risk_engine::{
    config::{AppConfig, LoggingConfig},
    consumer::{AnalysisRequest, RequestKind, TransactionConsumer},
    metrics::{MetricsReporter, PipelineMetrics},
    narrative::ChatCompletionsClient,
    orchestrator::RiskOrchestrator,
    producer::ResultProducer,
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("fraud_risk_engine={}", logging.level).parse()?);

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Fraud Risk Engine");
    info!(
        "Review threshold: {:.2}, weights: rule={:.2} narrative={:.2}, batch concurrency: {}",
        config.scoring.review_threshold,
        config.scoring.rule_weight,
        config.scoring.narrative_weight,
        config.scoring.batch_concurrency
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Text generation client; a missing credential is fatal
    let generator = Arc::new(
        ChatCompletionsClient::new(&config.narrative)
            .context("Failed to initialize text generation client")?,
    );
    info!(
        endpoint = %config.narrative.endpoint,
        model = %generator.model(),
        "Text generation client initialized"
    );

    let orchestrator = Arc::new(
        RiskOrchestrator::new(generator, &config.rules, &config.scoring)?
            .with_metrics(metrics.clone()),
    );

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = TransactionConsumer::new(
        client.clone(),
        &config.nats.transaction_subject,
        &config.nats.batch_subject,
    );
    let producer = Arc::new(ResultProducer::new(
        client.clone(),
        &config.nats.result_subject,
        &config.nats.alert_subject,
        config.scoring.risk_levels.clone(),
    ));
    info!("Publishing review alerts to: {}", producer.alert_subject());

    // Start metrics reporter
    let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.metrics_interval_secs);
    tokio::spawn(reporter.start());

    let singles = consumer
        .subscribe(RequestKind::Single)
        .await?
        .map(|message| (RequestKind::Single, message));
    let batches = consumer
        .subscribe(RequestKind::Batch)
        .await?
        .map(|message| (RequestKind::Batch, message));
    let mut requests = futures::stream::select(singles, batches).boxed();

    let num_workers = config.pipeline.workers.max(1);
    info!("Starting request loop with {} parallel workers", num_workers);
    let semaphore = Arc::new(Semaphore::new(num_workers));

    while let Some((kind, message)) = requests.next().await {
        let permit = semaphore.clone().acquire_owned().await?;

        let orchestrator = orchestrator.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();

        tokio::spawn(async move {
            handle_request(kind, message, &orchestrator, &producer, &metrics).await;
            drop(permit);
        });
    }

    info!("Risk engine shutting down...");
    metrics.print_summary();

    Ok(())
}

async fn handle_request(
    kind: RequestKind,
    message: Message,
    orchestrator: &RiskOrchestrator,
    producer: &ResultProducer,
    metrics: &PipelineMetrics,
) {
    let start = Instant::now();
    let reply_to = message.reply.clone();

    let request = match AnalysisRequest::decode(kind, &message.payload) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, kind = ?kind, "Failed to deserialize request");
            metrics.record_rejection();
            if let Err(e) = producer.reply_error(reply_to, &e.to_string()).await {
                error!(error = %e, "Failed to send error reply");
            }
            return;
        }
    };

    let outcome = match &request {
        AnalysisRequest::Single(tx) => match orchestrator.analyze_transaction(tx).await {
            Ok(result) => {
                if let Err(e) = producer.publish_alerts(std::slice::from_ref(&result)).await {
                    error!(error = %e, "Failed to publish alerts");
                }
                producer.reply(reply_to.clone(), &result).await
            }
            Err(e) => Err(e.into()),
        },
        AnalysisRequest::Batch(transactions) => {
            match orchestrator.analyze_batch(transactions).await {
                Ok(batch) => {
                    if let Err(e) = producer.publish_alerts(&batch.results).await {
                        error!(error = %e, "Failed to publish alerts");
                    }
                    producer.reply(reply_to.clone(), &batch).await
                }
                Err(e) => Err(e.into()),
            }
        }
    };

    match outcome {
        Ok(()) => debug!(
            kind = ?kind,
            transactions = request.len(),
            processing_time_us = start.elapsed().as_micros(),
            "Request processed"
        ),
        Err(e) => {
            warn!(error = %e, kind = ?kind, "Request failed");
            metrics.record_rejection();
            if let Err(e) = producer.reply_error(reply_to, &e.to_string()).await {
                error!(error = %e, "Failed to send error reply");
            }
        }
    }
}
