//! Outbound message sender trait and implementations.

use async_trait::async_trait;

use crate::error::LifecycleError;

/// Trait for sending messages to leads.
///
/// Abstracted to support different transports (the WhatsApp gateway,
/// tests, etc.)
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send a text message to a lead.
    ///
    /// # Arguments
    /// * `conversation_id` - Conversation the message belongs to
    /// * `recipient` - Lead phone number
    /// * `text` - Message content
    async fn send(
        &self,
        conversation_id: &str,
        recipient: &str,
        text: &str,
    ) -> Result<(), LifecycleError>;
}

/// A no-op message sender for testing that discards all messages.
#[derive(Debug, Clone, Default)]
pub struct NoOpSender;

#[async_trait]
impl MessageSender for NoOpSender {
    async fn send(
        &self,
        _conversation_id: &str,
        _recipient: &str,
        _text: &str,
    ) -> Result<(), LifecycleError> {
        Ok(())
    }
}

/// A logging message sender for debugging that logs all sends.
#[derive(Debug, Clone, Default)]
pub struct LoggingSender;

#[async_trait]
impl MessageSender for LoggingSender {
    async fn send(
        &self,
        conversation_id: &str,
        recipient: &str,
        text: &str,
    ) -> Result<(), LifecycleError> {
        tracing::info!(
            "[{}] Sending message to {}: {}",
            conversation_id,
            recipient,
            text
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_sender() {
        let sender = NoOpSender;
        sender.send("conv-1", "+5511999887766", "hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_logging_sender() {
        let sender = LoggingSender;
        sender.send("conv-1", "+5511999887766", "hello").await.unwrap();
    }
}
