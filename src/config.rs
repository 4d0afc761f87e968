//! Configuration management for the fraud scoring service.
//!
//! Values come from three layers, later layers overriding earlier ones:
//! built-in defaults, the TOML config file, and `FRAUD_SCORING__*`
//! environment variables (`__` separates sections, so
//! `FRAUD_SCORING__HTTP__PORT=9000` overrides `[http] port`).

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub model: ModelConfig,
    pub http: HttpConfig,
    pub pipeline: PipelineConfig,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

/// Message bus connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming transaction events
    pub input_subject: String,
    /// Subject for outgoing scoring results
    pub output_subject: String,
    /// Queue group; instances sharing it split the stream
    pub queue_group: String,
}

/// Model artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Filesystem path of the artifact, used at startup and on `/reload`
    pub path: String,
}

/// Control plane configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port the control plane binds on
    pub port: u16,
}

/// Scoring loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Bounded wait per bus poll, keeps the loop responsive to shutdown
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    /// Only events whose rule band matches (case-insensitive) are scored.
    /// Empty string disables gating and every valid event is forwarded.
    #[serde(default = "default_rule_band_gate")]
    pub rule_band_gate: String,
    /// How often buffered publishes are flushed to the bus
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// Seconds between metrics summary logs
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
}

fn default_poll_timeout_ms() -> u64 {
    1000
}

fn default_rule_band_gate() -> String {
    "GRAY".to_string()
}

fn default_flush_interval_ms() -> u64 {
    1000
}

fn default_report_interval_secs() -> u64 {
    30
}

/// Trainer collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Command that runs one full training cycle and prints the outcome
    /// JSON (`model_path`, `model_version`, `metrics`) on stdout
    pub command: String,
    /// Arguments passed to the training command
    #[serde(default)]
    pub args: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from the default file location (overridable with
    /// `FRAUD_SCORING_CONFIG`) plus environment overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var("FRAUD_SCORING_CONFIG")
            .unwrap_or_else(|_| "config/config.toml".to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("FRAUD_SCORING")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                input_subject: "fraud.rules".to_string(),
                output_subject: "fraud.ml".to_string(),
                queue_group: "fraud-scoring-service".to_string(),
            },
            model: ModelConfig {
                path: "model_artifacts/fraud_model.json".to_string(),
            },
            http: HttpConfig { port: 8091 },
            pipeline: PipelineConfig {
                poll_timeout_ms: default_poll_timeout_ms(),
                rule_band_gate: default_rule_band_gate(),
                flush_interval_ms: default_flush_interval_ms(),
                report_interval_secs: default_report_interval_secs(),
            },
            training: TrainingConfig {
                command: "python3".to_string(),
                args: vec!["training/train.py".to_string()],
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
