//! Message bus consumer for incoming transaction events.

use anyhow::Result;
use async_nats::{Client, Message, Subscriber};
use tracing::info;

/// Header carrying the optional message key. NATS messages have no native
/// key, so producers that want Kafka-style keying set this header.
pub const MSG_KEY_HEADER: &str = "Nats-Msg-Key";

/// Consumer for receiving transaction events from the bus.
///
/// Subscribes as a queue-group member, so multiple service instances on the
/// same subject split the stream like independent consumer-group members
/// rather than each receiving every event.
pub struct EventConsumer {
    client: Client,
    subject: String,
    queue_group: String,
}

impl EventConsumer {
    /// Create a new event consumer
    pub fn new(client: Client, subject: &str, queue_group: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
            queue_group: queue_group.to_string(),
        }
    }

    /// Subscribe to the input subject as part of the queue group
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self
            .client
            .queue_subscribe(self.subject.clone(), self.queue_group.clone())
            .await?;
        info!(
            subject = %self.subject,
            queue_group = %self.queue_group,
            "Subscribed to transaction events"
        );
        Ok(subscriber)
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Optional UTF-8 message key, read from the key header.
pub fn message_key(message: &Message) -> Option<String> {
    message
        .headers
        .as_ref()
        .and_then(|headers| headers.get(MSG_KEY_HEADER))
        .map(|value| value.as_str().to_string())
}

#[cfg(test)]
mod tests {
    // Subscription tests require a running NATS server; key extraction is
    // covered through the pipeline helper tests.
}
