//! Error taxonomy for the scoring pipeline.
//!
//! Per-message failures (decode, missing identifier) are logged and the
//! ingress loop moves on; reload and training failures are surfaced through
//! the control plane without ever corrupting the active model.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bus connectivity or poll failure. Logged, loop continues.
    #[error("transport error: {0}")]
    Transport(String),

    /// Message value is absent, not UTF-8 JSON, or not a JSON object.
    #[error("invalid message payload: {0}")]
    Decode(String),

    /// Neither the event's `transactionId` nor the message key is usable.
    #[error("no resolvable transaction id")]
    MissingIdentifier,

    /// Model artifact missing or corrupt at the given path. The previously
    /// active artifact stays in place.
    #[error("failed to load model artifact from {path}: {reason}")]
    Reload { path: String, reason: String },

    /// Any failure inside the trainer collaborator. Captured into the
    /// training status, visible via `/status`.
    #[error("training failed: {0}")]
    Training(String),
}
