//! Model artifact loading and scoring.
//!
//! An artifact is an immutable bundle of a fitted classifier plus its
//! metadata, produced either at training time or loaded from disk. It is
//! never mutated after construction; a reload builds a fresh artifact and
//! swaps it in wholesale.

use crate::error::PipelineError;
use crate::normalizer;
use crate::types::TransactionEvent;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Fitted logistic-regression classifier stored inside a model artifact.
///
/// One coefficient per canonical feature, in artifact `feature_order`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegressionModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticRegressionModel {
    /// Fraud probability for one canonical feature vector.
    pub fn predict_probability(&self, features: &[f64]) -> f64 {
        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(weight, value)| weight * value)
                .sum::<f64>();
        1.0 / (1.0 + (-z).exp())
    }
}

/// Immutable, versioned model bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    /// Fitted classifier
    pub model: LogisticRegressionModel,

    /// Canonical feature names, in vector position order
    pub feature_order: Vec<String>,

    /// Version string stamped onto every scoring result
    pub model_version: String,

    /// When the classifier was fitted (RFC 3339), if recorded
    #[serde(default)]
    pub trained_at: Option<String>,

    /// Held-out evaluation metrics from the training run
    #[serde(default)]
    pub metrics: Option<HashMap<String, f64>>,

    /// Number of labeled rows the classifier was fitted on
    #[serde(default)]
    pub dataset_size: Option<u64>,
}

impl ModelArtifact {
    /// Load and validate an artifact from a JSON file.
    ///
    /// The artifact is fully deserialized and checked before it is returned,
    /// so a caller swapping models can never observe a half-built one.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let reload_error = |reason: String| PipelineError::Reload {
            path: path.display().to_string(),
            reason,
        };

        let raw = fs::read_to_string(path).map_err(|e| reload_error(e.to_string()))?;
        let artifact: ModelArtifact =
            serde_json::from_str(&raw).map_err(|e| reload_error(e.to_string()))?;

        if artifact.feature_order.is_empty() {
            return Err(reload_error("artifact declares no features".to_string()));
        }
        if artifact.model.coefficients.len() != artifact.feature_order.len() {
            return Err(reload_error(format!(
                "classifier has {} coefficients but feature_order lists {} features",
                artifact.model.coefficients.len(),
                artifact.feature_order.len()
            )));
        }

        Ok(artifact)
    }

    /// Score one raw event: normalize against this artifact's feature order,
    /// then run the classifier. Deterministic given `(artifact, event)`.
    pub fn score(&self, event: &TransactionEvent) -> f64 {
        let features = normalizer::normalize(event, &self.feature_order);
        self.model.predict_probability(&features).clamp(0.0, 1.0)
    }
}
