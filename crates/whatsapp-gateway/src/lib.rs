//! WhatsApp gateway client library.
//!
//! This crate provides a Rust client for the external WhatsApp messaging
//! gateway over HTTP. It supports:
//!
//! - Sending text and media messages to leads
//! - Parsing inbound webhook payloads (text, audio, media, location)
//! - Health checking and connection monitoring
//!
//! Inbound messages arrive by webhook (the gateway POSTs to the API
//! service), so unlike a streaming transport there is no subscription
//! here - just the payload types the webhook endpoint deserializes.
//!
//! # Example
//!
//! ```no_run
//! use whatsapp_gateway::{GatewayClient, GatewayConfig};
//!
//! # async fn example() -> Result<(), whatsapp_gateway::GatewayError> {
//! // Connect to the gateway
//! let config = GatewayConfig::from_env();
//! let client = GatewayClient::connect(config).await?;
//!
//! // Send a message
//! let receipt = client.send_text("+5511999887766", "Hello!").await?;
//! println!("Accepted as {}", receipt.message_id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::GatewayClient;
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use types::{DeliveryReceipt, InboundBody, InboundPayload, SendParams};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
