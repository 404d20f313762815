//! Test Transaction Producer
//!
//! Generates and publishes synthetic transactions to NATS for engine testing.
//! The NATS url and subjects come from the engine's own configuration.
//!
//! Usage: test_producer [count] [fraud_rate] [delay_ms] [batch_size]

use anyhow::Context;
use chrono::{Duration as ChronoDuration, Timelike, Utc};
use fraud_risk_engine::config::AppConfig;
use fraud_risk_engine::types::{CustomerHistory, PriorTransaction, Transaction};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

const MERCHANTS: &[&str] = &[
    "Local Grocery",
    "Coffee Shop",
    "Online Electronics Store",
    "Gas Station",
    "Pharmacy",
];
const LOCATIONS: &[&str] = &["New York, NY", "Chicago, IL", "Austin, TX", "Seattle, WA"];
const SUSPICIOUS_MERCHANTS: &[&str] = &["Unknown", "New Merchant"];

/// Transaction generator for testing
struct TransactionGenerator {
    rng: rand::rngs::ThreadRng,
    transaction_counter: u64,
}

impl TransactionGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            transaction_counter: 0,
        }
    }

    /// Generate a random legitimate transaction
    fn generate_legitimate(&mut self) -> Transaction {
        self.transaction_counter += 1;
        let now = Utc::now();
        let hour = self.rng.gen_range(8..22);
        let timestamp = now.with_hour(hour).unwrap_or(now);

        let history_len = self.rng.gen_range(3..10);
        let location_changes = self.rng.gen_range(0..2);
        let history = self.history(history_len, location_changes);

        Transaction::new(
            format!("tx_{:012}", self.transaction_counter),
            (self.rng.gen_range(10.0..500.0_f64) * 100.0).round() / 100.0,
            self.random_choice(MERCHANTS),
            self.random_choice(LOCATIONS),
            timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
        )
        .with_history(history)
    }

    /// Generate a suspicious transaction
    fn generate_suspicious(&mut self) -> Transaction {
        self.transaction_counter += 1;
        let now = Utc::now();
        let hour = self.rng.gen_range(0..6); // Night time
        let timestamp = now.with_hour(hour).unwrap_or(now);

        let location = if self.rng.gen_bool(0.5) {
            "High Risk Area"
        } else {
            self.random_choice(LOCATIONS)
        };

        let mut tx = Transaction::new(
            format!("tx_{:012}", self.transaction_counter),
            (self.rng.gen_range(1000.0..10000.0_f64) * 100.0).round() / 100.0, // High amount
            self.random_choice(SUSPICIOUS_MERCHANTS),
            location,
            timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
        );

        // Thin or missing history with frequent location changes
        if self.rng.gen_bool(0.5) {
            let history_len = self.rng.gen_range(0..3);
            let location_changes = self.rng.gen_range(3..8);
            tx = tx.with_history(self.history(history_len, location_changes));
        }

        tx
    }

    fn history(&mut self, len: usize, location_changes: u32) -> CustomerHistory {
        let today = Utc::now().date_naive();
        let previous = (0..len)
            .map(|i| {
                let date = today - ChronoDuration::days((len - i) as i64);
                PriorTransaction::new(
                    (self.rng.gen_range(5.0..200.0_f64) * 100.0).round() / 100.0,
                    self.random_choice(MERCHANTS),
                    date.format("%Y-%m-%d").to_string(),
                )
            })
            .collect();

        CustomerHistory::new(previous, location_changes)
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }

    /// Draw the next transaction, suspicious with probability `fraud_rate`
    fn next(&mut self, fraud_rate: f64) -> (Transaction, bool) {
        if self.rng.gen_bool(fraud_rate) {
            (self.generate_suspicious(), true)
        } else {
            (self.generate_legitimate(), false)
        }
    }
}

/// Where generated requests go
enum Sink {
    Nats(async_nats::Client),
    DryRun,
}

impl Sink {
    async fn send(&self, subject: &str, payload: Vec<u8>, sequence: u64) -> anyhow::Result<()> {
        match self {
            Sink::Nats(client) => {
                client.publish(subject.to_string(), payload.into()).await?;
            }
            Sink::DryRun => {
                if sequence == 1 || sequence % 10 == 0 {
                    info!(
                        subject = %subject,
                        "Sample request {}:\n{}",
                        sequence,
                        String::from_utf8_lossy(&payload)
                    );
                }
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Transaction Producer");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Engine configuration unavailable, using defaults");
            AppConfig::default()
        }
    };

    let args: Vec<String> = std::env::args().collect();
    let count: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.1_f64)
        .clamp(0.0, 1.0);
    let delay_ms: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let batch_size: usize = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(1).max(1);

    let subject = if batch_size > 1 {
        config.nats.batch_subject.as_str()
    } else {
        config.nats.transaction_subject.as_str()
    };

    info!(
        nats_url = %config.nats.url,
        subject = %subject,
        count,
        fraud_rate,
        delay_ms,
        batch_size,
        "Producer configured"
    );

    let sink = match async_nats::connect(&config.nats.url).await {
        Ok(client) => {
            info!("Connected to NATS");
            Sink::Nats(client)
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            Sink::DryRun
        }
    };

    let mut generator = TransactionGenerator::new();
    let mut suspicious_count = 0u64;
    let mut produced = 0u64;
    let mut requests = 0u64;

    while produced < count {
        let size = batch_size.min((count - produced) as usize);
        let mut transactions = Vec::with_capacity(size);
        for _ in 0..size {
            let (tx, suspicious) = generator.next(fraud_rate);
            suspicious_count += u64::from(suspicious);
            transactions.push(tx);
        }
        produced += size as u64;
        requests += 1;

        let payload = if batch_size > 1 {
            serde_json::to_vec(&transactions)
        } else {
            serde_json::to_vec(&transactions[0])
        }
        .context("Failed to serialize request")?;

        sink.send(subject, payload, requests).await?;

        if requests % 10 == 0 {
            info!(
                "Produced {}/{} transactions ({} suspicious) in {} requests",
                produced, count, suspicious_count, requests
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    if let Sink::Nats(client) = &sink {
        client.flush().await?;
    }

    info!(
        "Completed! Produced {} transactions ({} legitimate, {} suspicious) in {} requests",
        produced,
        produced - suspicious_count,
        suspicious_count,
        requests
    );

    Ok(())
}
