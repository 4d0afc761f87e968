//! The scoring loop: poll the bus, gate and decode events, score them
//! against the active model, publish results.
//!
//! Every per-message failure is logged and the loop moves to the next
//! message; nothing in here can take the loop down. The state lock is only
//! touched to snapshot the artifact reference; normalization, inference, and
//! publishing all run on that snapshot outside the lock.

use crate::config::PipelineConfig;
use crate::consumer::message_key;
use crate::metrics::PipelineMetrics;
use crate::producer::ResultProducer;
use crate::state::ServiceState;
use crate::types::event::decode_event;
use crate::types::{ScoringResult, TransactionEvent};
use async_nats::{Message, Subscriber};
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

pub struct ScoringPipeline {
    state: Arc<ServiceState>,
    producer: Arc<ResultProducer>,
    metrics: Arc<PipelineMetrics>,
    /// Case-normalized rule band required for scoring; `None` means ungated
    gate_band: Option<String>,
    poll_timeout: Duration,
}

impl ScoringPipeline {
    pub fn new(
        state: Arc<ServiceState>,
        producer: Arc<ResultProducer>,
        metrics: Arc<PipelineMetrics>,
        config: &PipelineConfig,
    ) -> Self {
        let gate_band = if config.rule_band_gate.is_empty() {
            None
        } else {
            Some(config.rule_band_gate.to_ascii_uppercase())
        };

        Self {
            state,
            producer,
            metrics,
            gate_band,
            poll_timeout: Duration::from_millis(config.poll_timeout_ms),
        }
    }

    /// Run the ingress loop until the subscription closes.
    ///
    /// Each poll waits at most `poll_timeout`, so the surrounding task stays
    /// responsive to shutdown without busy-spinning.
    pub async fn run(&self, mut subscriber: Subscriber) {
        info!(
            gate_band = self.gate_band.as_deref().unwrap_or("<none>"),
            "Scoring loop started"
        );

        loop {
            match tokio::time::timeout(self.poll_timeout, subscriber.next()).await {
                // nothing arrived within the poll window
                Err(_) => continue,
                Ok(None) => {
                    warn!("Subscription closed, stopping scoring loop");
                    break;
                }
                Ok(Some(message)) => self.handle_message(&message).await,
            }
        }
    }

    async fn handle_message(&self, message: &Message) {
        let start = Instant::now();

        let event = match decode_event(&message.payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(subject = %message.subject, error = %e, "Skipping undecodable message");
                self.metrics.record_skipped();
                return;
            }
        };

        // events outside the gated band are dropped silently, not scored
        if !gate_allows(self.gate_band.as_deref(), &event) {
            self.metrics.record_gated();
            return;
        }

        let key = message_key(message);
        let Some(transaction_id) = resolve_transaction_id(&event, key.as_deref()) else {
            warn!("Skipping event without transaction id or message key");
            self.metrics.record_skipped();
            return;
        };

        // one artifact snapshot per scoring call; the lock is released
        // before inference runs
        let artifact = self.state.current_artifact();
        let score = artifact.score(scoring_input(&event));
        let result = ScoringResult::new(
            transaction_id.clone(),
            score,
            artifact.model_version.clone(),
        );

        self.metrics.record_scored(start.elapsed(), result.ml_score);

        match self.producer.publish(&transaction_id, &result).await {
            Ok(()) => {
                self.metrics.record_published();
                info!(
                    transaction_id = %transaction_id,
                    ml_score = result.ml_score,
                    model_version = %result.model_version,
                    "Scored transaction"
                );
            }
            Err(e) => {
                error!(
                    transaction_id = %transaction_id,
                    error = %e,
                    "Failed to publish scoring result"
                );
            }
        }
    }
}

/// Whether the event passes the rule-band gate.
///
/// With no gate configured every valid event is forwarded. With a gate, the
/// event's `ruleBand`/`rule_band` field must case-insensitively match; a
/// missing or non-string band never matches.
fn gate_allows(gate_band: Option<&str>, event: &TransactionEvent) -> bool {
    let Some(band) = gate_band else {
        return true;
    };

    let raw = event.get("ruleBand").or_else(|| event.get("rule_band"));
    match raw {
        Some(Value::String(s)) => s.to_ascii_uppercase() == band,
        _ => false,
    }
}

/// The map the model scores on.
///
/// Some producers ship the scoring fields pre-collected under a nested
/// `features` object; when that object is present it is the scoring input,
/// and the envelope fields (`transactionId`, `ruleBand`) stay top-level.
/// Everything else scores on the event itself.
fn scoring_input(event: &TransactionEvent) -> &TransactionEvent {
    match event.get("features") {
        Some(Value::Object(features)) => features,
        _ => event,
    }
}

/// The event's `transactionId`, falling back to the message key. Empty
/// strings and zero count as absent; numeric ids are stringified.
fn resolve_transaction_id(event: &TransactionEvent, key: Option<&str>) -> Option<String> {
    match event.get("transactionId") {
        Some(Value::String(id)) if !id.is_empty() => return Some(id.clone()),
        Some(Value::Number(n)) if n.as_f64().is_some_and(|f| f != 0.0) => {
            return Some(n.to_string());
        }
        _ => {}
    }
    key.filter(|k| !k.is_empty()).map(|k| k.to_string())
}
