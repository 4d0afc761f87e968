//! Trainer collaborator contract.
//!
//! Training itself lives outside this service: a separate pipeline queries
//! the store of reviewed, labeled fraud decisions, fits a classifier, writes
//! a new artifact file and a model-registry row. The core only needs the
//! narrow outcome of that run to swap the new artifact in.

use crate::error::PipelineError;
use serde::Deserialize;
use std::collections::HashMap;
use std::process::Command;
use tracing::info;

/// What a completed training run reports back.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingOutcome {
    /// Where the freshly trained artifact was persisted
    pub model_path: String,
    /// Version assigned to the new model
    pub model_version: String,
    /// Held-out evaluation metrics
    #[serde(default)]
    pub metrics: HashMap<String, f64>,
}

/// The collaborator invoked by `/retrain`.
///
/// `train` runs one full cycle synchronously; the control plane drives it on
/// a blocking task, and the single-in-flight invariant is enforced by the
/// service state, not here.
pub trait Trainer: Send + Sync {
    fn train(&self) -> Result<TrainingOutcome, PipelineError>;
}

/// Runs a configured external training command and parses the outcome JSON
/// it prints on stdout.
pub struct CommandTrainer {
    command: String,
    args: Vec<String>,
}

impl CommandTrainer {
    pub fn new(command: String, args: Vec<String>) -> Self {
        Self { command, args }
    }
}

impl Trainer for CommandTrainer {
    fn train(&self) -> Result<TrainingOutcome, PipelineError> {
        info!(command = %self.command, "Launching training command");

        let output = Command::new(&self.command)
            .args(&self.args)
            .output()
            .map_err(|e| {
                PipelineError::Training(format!("failed to launch {}: {}", self.command, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Training(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            PipelineError::Training(format!("unreadable training outcome: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_trainer_parses_outcome() {
        let outcome_json = r#"{"model_path":"/tmp/fraud_model.json","model_version":"model_v7","metrics":{"roc_auc":0.93}}"#;
        let trainer = CommandTrainer::new("echo".to_string(), vec![outcome_json.to_string()]);

        let outcome = trainer.train().unwrap();
        assert_eq!(outcome.model_path, "/tmp/fraud_model.json");
        assert_eq!(outcome.model_version, "model_v7");
        assert_eq!(outcome.metrics["roc_auc"], 0.93);
    }

    #[test]
    fn test_command_trainer_failure_is_training_error() {
        let trainer = CommandTrainer::new("false".to_string(), vec![]);
        assert!(matches!(
            trainer.train(),
            Err(PipelineError::Training(_))
        ));
    }

    #[test]
    fn test_command_trainer_garbage_output_is_training_error() {
        let trainer = CommandTrainer::new("echo".to_string(), vec!["not json".to_string()]);
        assert!(matches!(
            trainer.train(),
            Err(PipelineError::Training(_))
        ));
    }

    #[test]
    fn test_missing_command_is_training_error() {
        let trainer = CommandTrainer::new("definitely-not-a-binary-xyz".to_string(), vec![]);
        assert!(matches!(
            trainer.train(),
            Err(PipelineError::Training(_))
        ));
    }
}
