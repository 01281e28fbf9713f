//! Notification routes.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use database::models::Notification;
use database::notification;

use crate::auth;
use crate::error::Result;
use crate::state::AppState;

/// Listing filter.
#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread: bool,
}

/// List a user's notifications, newest first.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Notification>>> {
    auth::check(&headers, &state.api_token)?;
    let notifications =
        notification::list_for_user(state.db.pool(), &user_id, query.unread).await?;
    Ok(Json(notifications))
}

/// Mark a notification as read.
pub async fn mark_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    auth::check(&headers, &state.api_token)?;
    notification::mark_read(state.db.pool(), id).await?;
    Ok(Json(serde_json::json!({ "read": id })))
}
