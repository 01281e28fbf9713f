//! Parla API server.
//!
//! Wires the persistence layer, lifecycle manager, playbook selector,
//! and WhatsApp gateway behind an axum HTTP surface: webhook intake,
//! operator actions, CRUD for leads/tags/topics/playbooks, and the
//! manual re-engagement trigger.

mod auth;
mod config;
mod error;
mod routes;
mod sender;
mod state;

use database::Database;
use playbook::HttpSemanticIndex;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use whatsapp_gateway::{GatewayClient, GatewayConfig};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting Parla API server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // The gateway is optional at boot: a down gateway should not keep
    // the API from serving operators; outbound sends fail per-request
    // until it comes back.
    let gateway = match GatewayClient::connect(GatewayConfig::from_env()).await {
        Ok(client) => Some(client),
        Err(e) => {
            warn!("WhatsApp gateway unavailable at startup: {}", e);
            None
        }
    };

    // Semantic index is optional; without it the playbook selector
    // always reports no match.
    let index = match config.index_url.as_deref() {
        Some(url) => match HttpSemanticIndex::new(url, config.index_token.clone()) {
            Ok(index) => Some(index),
            Err(e) => {
                warn!("Semantic index misconfigured, selector disabled: {}", e);
                None
            }
        },
        None => {
            info!("No semantic index configured, playbook suggestions disabled");
            None
        }
    };

    // Build application state
    let state = AppState::new(db, gateway, index, config.api_token.clone());

    // Build router
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    info!(addr = %config.addr, "Parla API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
