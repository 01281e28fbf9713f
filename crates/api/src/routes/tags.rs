//! Tag routes.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use database::models::Tag;
use database::tag;

use crate::auth;
use crate::error::Result;
use crate::state::AppState;

/// Default tag color when the client does not pick one.
const DEFAULT_COLOR: &str = "#9e9e9e";

/// Body for creating a tag.
#[derive(Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// List all tags.
pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Vec<Tag>>> {
    auth::check(&headers, &state.api_token)?;
    Ok(Json(tag::list_tags(state.db.pool()).await?))
}

/// Create a tag.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateTagRequest>,
) -> Result<Json<Tag>> {
    auth::check(&headers, &state.api_token)?;

    let color = req.color.as_deref().unwrap_or(DEFAULT_COLOR);
    let tag = tag::create_tag(state.db.pool(), &req.name, color).await?;
    Ok(Json(tag))
}

/// Delete a tag and its associations.
pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    auth::check(&headers, &state.api_token)?;

    tag::delete_tag(state.db.pool(), id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
