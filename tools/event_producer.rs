//! Test Event Producer
//!
//! Generates and publishes synthetic transaction events to NATS for pipeline
//! testing. Events deliberately mix snake_case and camelCase field names the
//! way real upstream producers do, and a slice of them falls outside the
//! GRAY rule band to exercise the gate.

use async_nats::HeaderMap;
use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

const MSG_KEY_HEADER: &str = "Nats-Msg-Key";

/// Synthetic transaction event generator
struct EventGenerator {
    rng: rand::rngs::ThreadRng,
    event_counter: u64,
}

impl EventGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            event_counter: 0,
        }
    }

    /// Generate an ordinary gray-band transaction
    fn generate_ordinary(&mut self) -> Value {
        self.event_counter += 1;

        json!({
            "transactionId": format!("tx_{:012}", self.event_counter),
            "ruleBand": "GRAY",
            "amount": self.rng.gen_range(10_000.0..2_000_000.0),
            "amountUsdEquivalent": self.rng.gen_range(5.0..500.0),
            "amountRiskTier": self.random_choice(&["LOW", "MEDIUM"]),
            "txCountLast1Min": self.rng.gen_range(0..3),
            "txAmountLast1Hour": self.rng.gen_range(0.0..500_000.0),
            "isNewDevice": self.rng.gen_bool(0.1),
            "crossBorder": self.rng.gen_bool(0.05),
            "senderAccountAgeDays": self.rng.gen_range(90..2000),
            "receiverAccountAgeDays": self.rng.gen_range(90..2000),
            "senderTxCount24h": self.rng.gen_range(0..8),
            "senderTotalAmountUsd24h": self.rng.gen_range(0.0..1500.0),
            "receiverInboundCount24h": self.rng.gen_range(0..5),
            "senderReceiverTxCount24h": self.rng.gen_range(0..3),
            "firstTimeContact": self.rng.gen_bool(0.2),
            "eventTime": Utc::now().to_rfc3339(),
        })
    }

    /// Generate a suspicious gray-band transaction: burst of small amounts
    /// from a new device at night
    fn generate_suspicious(&mut self) -> Value {
        self.event_counter += 1;

        json!({
            "transactionId": format!("tx_{:012}", self.event_counter),
            "rule_band": "gray",
            "amount": self.rng.gen_range(50_000.0..500_000.0),
            "amount_usd_equivalent": self.rng.gen_range(2.0..14.0),
            "amountRiskTier": self.random_choice(&["HIGH", "CRITICAL"]),
            "tx_count_1min": self.rng.gen_range(5..12),
            "tx_amount_1hour": self.rng.gen_range(1_000_000.0..8_000_000.0),
            "newDevice": true,
            "is_overseas": true,
            "is_night": 1,
            "senderAccountAgeDays": self.rng.gen_range(1..30),
            "receiverAccountAgeDays": self.rng.gen_range(1..60),
            "senderTxCount24h": self.rng.gen_range(30..80),
            "senderTotalAmountUsd24h": self.rng.gen_range(100.0..600.0),
            "receiverInboundCount24h": self.rng.gen_range(20..60),
            "senderReceiverTxCount24h": 0,
            "firstTimeContact": true,
            "eventTime": Utc::now().to_rfc3339(),
        })
    }

    /// Generate an event outside the gray band; the pipeline must drop it
    fn generate_ungated(&mut self) -> Value {
        self.event_counter += 1;

        json!({
            "transactionId": format!("tx_{:012}", self.event_counter),
            "ruleBand": self.random_choice(&["WHITE", "BLACK"]),
            "amount": self.rng.gen_range(10_000.0..2_000_000.0),
            "eventTime": Utc::now().to_rfc3339(),
        })
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("event_producer=info".parse()?),
        )
        .init();

    info!("Starting test event producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("fraud.rules");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let suspicious_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        suspicious_rate = suspicious_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, suspicious_rate, delay_ms).await;
        }
    };

    let mut generator = EventGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Publishing {} events...", count);

    let mut ordinary_count = 0;
    let mut suspicious_count = 0;
    let mut ungated_count = 0;

    for i in 0..count {
        // roughly one in ten events falls outside the gray band
        let event = if rng.gen_bool(0.1) {
            ungated_count += 1;
            generator.generate_ungated()
        } else if rng.gen_bool(suspicious_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            ordinary_count += 1;
            generator.generate_ordinary()
        };

        let key = event["transactionId"].as_str().unwrap_or_default().to_string();
        let payload = serde_json::to_vec(&event)?;

        let mut headers = HeaderMap::new();
        headers.insert(MSG_KEY_HEADER, key.as_str());

        client
            .publish_with_headers(subject.to_string(), headers, payload.into())
            .await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} events ({} ordinary, {} suspicious, {} outside the gate)",
                i + 1,
                count,
                ordinary_count,
                suspicious_count,
                ungated_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    client.flush().await?;
    info!(
        "Completed! Published {} events ({} ordinary, {} suspicious, {} outside the gate)",
        count, ordinary_count, suspicious_count, ungated_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, suspicious_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = EventGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let event = if rng.gen_bool(suspicious_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_ordinary()
        };

        let json = serde_json::to_string_pretty(&event)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample event {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
