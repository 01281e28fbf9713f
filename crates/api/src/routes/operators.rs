//! Operator routes.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use database::models::Operator;
use database::operator;

use crate::auth;
use crate::error::Result;
use crate::state::AppState;

/// Body for creating an operator.
#[derive(Deserialize)]
pub struct CreateOperatorRequest {
    pub name: String,
    pub email: String,
}

/// Body for the active flag.
#[derive(Deserialize)]
pub struct ActiveRequest {
    pub active: bool,
}

/// List all operators.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Operator>>> {
    auth::check(&headers, &state.api_token)?;
    Ok(Json(operator::list_operators(state.db.pool()).await?))
}

/// Create an operator.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateOperatorRequest>,
) -> Result<Json<Operator>> {
    auth::check(&headers, &state.api_token)?;

    let pool = state.db.pool();
    let new_operator = Operator {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        email: req.email,
        active: true,
        created_at: String::new(),
    };
    operator::create_operator(pool, &new_operator).await?;

    Ok(Json(operator::get_operator(pool, &new_operator.id).await?))
}

/// Activate or deactivate an operator.
pub async fn set_active(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ActiveRequest>,
) -> Result<Json<Operator>> {
    auth::check(&headers, &state.api_token)?;

    let pool = state.db.pool();
    operator::set_active(pool, &id, req.active).await?;
    Ok(Json(operator::get_operator(pool, &id).await?))
}
