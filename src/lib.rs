//! Fraud Scoring Service Library
//!
//! An online fraud-scoring pipeline: transaction events are consumed from the
//! message bus, normalized into a canonical feature vector, scored with the
//! currently active model artifact, and republished. An HTTP control plane
//! allows hot-swapping the model and triggering asynchronous retraining while
//! the scoring loop keeps running.

pub mod config;
pub mod consumer;
pub mod error;
pub mod http;
pub mod metrics;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod producer;
pub mod state;
pub mod trainer;
pub mod types;

pub use config::AppConfig;
pub use consumer::EventConsumer;
pub use model::ModelArtifact;
pub use pipeline::ScoringPipeline;
pub use producer::ResultProducer;
pub use state::ServiceState;
pub use types::{ScoringResult, TransactionEvent};
