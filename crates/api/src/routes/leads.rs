//! Lead routes.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use database::lead;
use database::models::Lead;

use crate::auth;
use crate::error::Result;
use crate::state::AppState;

/// Body for creating a lead.
#[derive(Deserialize)]
pub struct CreateLeadRequest {
    pub phone: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body for updating a lead.
#[derive(Deserialize)]
pub struct UpdateLeadRequest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body for the maturity score.
#[derive(Deserialize)]
pub struct MaturityRequest {
    pub maturity_score: i64,
}

/// List non-deleted leads.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Lead>>> {
    auth::check(&headers, &state.api_token)?;
    Ok(Json(lead::list_leads(state.db.pool()).await?))
}

/// Create a lead manually (outside webhook intake).
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateLeadRequest>,
) -> Result<Json<Lead>> {
    auth::check(&headers, &state.api_token)?;

    let pool = state.db.pool();
    let new_lead = Lead {
        id: Uuid::new_v4().to_string(),
        phone: req.phone,
        name: req.name,
        email: req.email,
        maturity_score: 0,
        assigned_operator_id: None,
        deleted_at: None,
        created_at: String::new(),
        updated_at: String::new(),
    };
    lead::create_lead(pool, &new_lead).await?;

    Ok(Json(lead::get_lead(pool, &new_lead.id).await?))
}

/// Get a lead by ID. Soft-deleted leads remain retrievable here.
pub async fn detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Lead>> {
    auth::check(&headers, &state.api_token)?;
    Ok(Json(lead::get_lead(state.db.pool(), &id).await?))
}

/// Update a lead's name and email.
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateLeadRequest>,
) -> Result<Json<Lead>> {
    auth::check(&headers, &state.api_token)?;

    let pool = state.db.pool();
    lead::update_lead(pool, &id, &req.name, req.email.as_deref()).await?;
    Ok(Json(lead::get_lead(pool, &id).await?))
}

/// Soft-delete a lead.
pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Lead>> {
    auth::check(&headers, &state.api_token)?;

    let pool = state.db.pool();
    lead::soft_delete_lead(pool, &id).await?;
    Ok(Json(lead::get_lead(pool, &id).await?))
}

/// Set the maturity score (0-100).
pub async fn set_maturity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<MaturityRequest>,
) -> Result<Json<Lead>> {
    auth::check(&headers, &state.api_token)?;

    let pool = state.db.pool();
    lead::set_maturity_score(pool, &id, req.maturity_score).await?;
    Ok(Json(lead::get_lead(pool, &id).await?))
}
