//! WhatsApp gateway HTTP client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::types::{DeliveryReceipt, SendParams};

/// Error body returned by the gateway on failures.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Client for communicating with the WhatsApp gateway.
#[derive(Clone)]
pub struct GatewayClient {
    http: Client,
    config: GatewayConfig,
    connected: Arc<AtomicBool>,
}

impl GatewayClient {
    /// Connect to the gateway.
    ///
    /// Verifies reachability with a health check before returning.
    pub async fn connect(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(GatewayError::Http)?;

        let client = Self {
            http,
            config,
            connected: Arc::new(AtomicBool::new(false)),
        };

        if client.health_check().await? {
            client.connected.store(true, Ordering::SeqCst);
            info!("Connected to WhatsApp gateway at {}", client.config.base_url);
        } else {
            return Err(GatewayError::HealthCheckFailed);
        }

        Ok(client)
    }

    /// Check if currently connected to the gateway.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Perform a health check against the gateway.
    pub async fn health_check(&self) -> Result<bool, GatewayError> {
        let url = self.config.check_url();
        debug!("Health check: {}", url);

        match self.http.get(&url).send().await {
            Ok(resp) => {
                let ok = resp.status().is_success();
                self.connected.store(ok, Ordering::SeqCst);
                Ok(ok)
            }
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                Err(GatewayError::Http(e))
            }
        }
    }

    /// Send a text message to a phone number.
    pub async fn send_text(
        &self,
        recipient: &str,
        text: &str,
    ) -> Result<DeliveryReceipt, GatewayError> {
        self.send(SendParams {
            to: recipient.to_string(),
            body: text.to_string(),
            media_url: None,
        })
        .await
    }

    /// Send a media message (image, document, audio) with a caption.
    pub async fn send_media(
        &self,
        recipient: &str,
        media_url: &str,
        caption: &str,
    ) -> Result<DeliveryReceipt, GatewayError> {
        self.send(SendParams {
            to: recipient.to_string(),
            body: caption.to_string(),
            media_url: Some(media_url.to_string()),
        })
        .await
    }

    /// Send a message with explicit parameters.
    pub async fn send(&self, params: SendParams) -> Result<DeliveryReceipt, GatewayError> {
        let url = self.config.send_url();
        debug!("Sending message to {} via {}", params.to, url);

        let mut builder = self.http.post(&url).json(&params);
        if let Some(ref token) = self.config.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            self.connected.store(false, Ordering::SeqCst);
            GatewayError::Http(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| "no error detail".to_string());
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        self.connected.store(true, Ordering::SeqCst);

        let receipt: DeliveryReceipt = response.json().await?;
        info!(
            "Message accepted by gateway: {} ({})",
            receipt.message_id, receipt.status
        );
        Ok(receipt)
    }
}
