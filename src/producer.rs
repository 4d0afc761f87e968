//! Message bus producer for scoring results.

use crate::consumer::MSG_KEY_HEADER;
use crate::types::ScoringResult;
use anyhow::Result;
use async_nats::{Client, HeaderMap};
use tracing::debug;

/// Producer publishing scoring results to the output subject.
///
/// Publishes are buffered, non-blocking sends; a periodic [`flush`] drives
/// delivery. Callers must not assume a returned `Ok` means the result is
/// durable on the bus.
///
/// [`flush`]: ResultProducer::flush
#[derive(Clone)]
pub struct ResultProducer {
    client: Client,
    subject: String,
}

impl ResultProducer {
    /// Create a new result producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish one scoring result, keyed by transaction id
    pub async fn publish(&self, key: &str, result: &ScoringResult) -> Result<()> {
        let payload = serde_json::to_vec(result)?;

        let mut headers = HeaderMap::new();
        headers.insert(MSG_KEY_HEADER, key);

        self.client
            .publish_with_headers(self.subject.clone(), headers, payload.into())
            .await?;

        debug!(
            transaction_id = %result.transaction_id,
            ml_score = result.ml_score,
            model_version = %result.model_version,
            "Published scoring result"
        );

        Ok(())
    }

    /// Flush buffered publishes out to the server
    pub async fn flush(&self) -> Result<()> {
        self.client.flush().await?;
        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    // Publish tests require a running NATS server; serialization of the
    // result payload is covered in types::result.
}
