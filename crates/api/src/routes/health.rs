//! Health check route.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub gateway_connected: bool,
}

/// Report service health.
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    let gateway_connected = state
        .gateway
        .as_ref()
        .map(|g| g.is_connected())
        .unwrap_or(false);

    Json(Health {
        status: "ok",
        gateway_connected,
    })
}
