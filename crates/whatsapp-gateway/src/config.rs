//! Configuration types for the WhatsApp gateway client.

use std::env;

/// Configuration for connecting to the WhatsApp gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the gateway HTTP API (e.g., "http://localhost:3000").
    pub base_url: String,
    /// Bearer token for the gateway API, if it requires one.
    pub api_token: Option<String>,
    /// Sending account phone number for multi-number gateways.
    /// If None, assumes the gateway has a single configured number.
    pub account: Option<String>,
}

impl GatewayConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            account: None,
        }
    }

    /// Create configuration with a specific sending account.
    pub fn with_account(base_url: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            account: Some(account.into()),
        }
    }

    /// Attach a bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PARLA_WA_GATEWAY_URL` | Gateway base URL | `http://localhost:3000` |
    /// | `PARLA_WA_GATEWAY_TOKEN` | Bearer token | (none) |
    /// | `PARLA_WA_NUMBER` | Sending account number | (none) |
    pub fn from_env() -> Self {
        let base_url = env::var("PARLA_WA_GATEWAY_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Self {
            base_url,
            api_token: env::var("PARLA_WA_GATEWAY_TOKEN").ok(),
            account: env::var("PARLA_WA_NUMBER").ok(),
        }
    }

    /// Get the message send endpoint URL.
    pub fn send_url(&self) -> String {
        match &self.account {
            Some(account) => {
                let encoded = urlencoding::encode(account);
                format!("{}/api/v1/messages?account={}", self.base_url, encoded)
            }
            None => format!("{}/api/v1/messages", self.base_url),
        }
    }

    /// Get the health check endpoint URL.
    pub fn check_url(&self) -> String {
        format!("{}/api/v1/health", self.base_url)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_url_without_account() {
        let config = GatewayConfig::new("http://localhost:3000");
        assert_eq!(config.send_url(), "http://localhost:3000/api/v1/messages");
    }

    #[test]
    fn test_send_url_encodes_account() {
        let config = GatewayConfig::with_account("http://localhost:3000", "+5511999887766");
        assert_eq!(
            config.send_url(),
            "http://localhost:3000/api/v1/messages?account=%2B5511999887766"
        );
    }

    #[test]
    fn test_check_url() {
        let config = GatewayConfig::default();
        assert_eq!(config.check_url(), "http://localhost:3000/api/v1/health");
    }
}
