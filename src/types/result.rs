//! Scoring results published to the output subject.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of scoring one transaction event.
///
/// Serialized camelCase onto the wire; downstream consumers key on
/// `transactionId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResult {
    /// Transaction the score belongs to
    pub transaction_id: String,

    /// Fraud probability in [0, 1], rounded to 6 decimals
    pub ml_score: f64,

    /// Version of the model artifact that produced the score
    pub model_version: String,

    /// UTC timestamp of the scoring call
    pub evaluated_at: DateTime<Utc>,
}

impl ScoringResult {
    /// Create a result, rounding the score and stamping the current time.
    pub fn new(transaction_id: String, score: f64, model_version: String) -> Self {
        Self {
            transaction_id,
            ml_score: round_score(score),
            model_version,
            evaluated_at: Utc::now(),
        }
    }
}

/// Round a probability to 6 decimal places.
pub fn round_score(score: f64) -> f64 {
    (score * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_rounded_to_six_decimals() {
        let result = ScoringResult::new("tx-1".to_string(), 0.123_456_789, "model_v1".to_string());
        assert_eq!(result.ml_score, 0.123_457);

        assert_eq!(round_score(0.5), 0.5);
        assert_eq!(round_score(0.000_000_4), 0.0);
        assert_eq!(round_score(0.999_999_9), 1.0);
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let result = ScoringResult::new("tx-1".to_string(), 0.75, "model_v2".to_string());
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["transactionId"], "tx-1");
        assert_eq!(json["mlScore"], 0.75);
        assert_eq!(json["modelVersion"], "model_v2");
        assert!(json["evaluatedAt"].is_string());
    }

    #[test]
    fn test_round_trip() {
        let result = ScoringResult::new("tx-9".to_string(), 0.25, "model_v1".to_string());
        let json = serde_json::to_string(&result).unwrap();
        let back: ScoringResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.transaction_id, result.transaction_id);
        assert_eq!(back.ml_score, result.ml_score);
    }
}
