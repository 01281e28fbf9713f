//! Bridges the lifecycle sender trait onto the WhatsApp gateway.

use async_trait::async_trait;
use lifecycle::{LifecycleError, MessageSender};
use tracing::debug;
use whatsapp_gateway::GatewayClient;

/// Sends lifecycle messages (re-engagement nudges) through the gateway.
///
/// Holds an optional client so a deployment without a reachable gateway
/// still boots; sends then fail per-request and the sweep retries them
/// on a later run.
#[derive(Clone)]
pub struct GatewaySender {
    gateway: Option<GatewayClient>,
}

impl GatewaySender {
    /// Create a sender over an optional gateway client.
    pub fn new(gateway: Option<GatewayClient>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl MessageSender for GatewaySender {
    async fn send(
        &self,
        conversation_id: &str,
        recipient: &str,
        text: &str,
    ) -> Result<(), LifecycleError> {
        let gateway = self.gateway.as_ref().ok_or_else(|| LifecycleError::Send {
            conversation_id: conversation_id.to_string(),
            reason: "gateway not configured".to_string(),
        })?;

        let receipt = gateway.send_text(recipient, text).await.map_err(|e| {
            LifecycleError::Send {
                conversation_id: conversation_id.to_string(),
                reason: e.to_string(),
            }
        })?;

        debug!(
            conversation_id,
            message_id = %receipt.message_id,
            "Gateway accepted message"
        );
        Ok(())
    }
}
