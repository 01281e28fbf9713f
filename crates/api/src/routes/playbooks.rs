//! Topic, playbook, and suggestion routes.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

use database::models::{Playbook, PlaybookStep, Topic};
use database::playbook as playbook_store;
use playbook::StepRecommendation;

use crate::auth;
use crate::error::Result;
use crate::state::AppState;

/// Body for creating a topic.
#[derive(Deserialize)]
pub struct CreateTopicRequest {
    pub slug: String,
    pub title: String,
}

/// Body for creating a playbook.
#[derive(Deserialize)]
pub struct CreatePlaybookRequest {
    pub topic_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body for appending a step.
#[derive(Deserialize)]
pub struct AppendStepRequest {
    pub content: String,
    #[serde(default)]
    pub context_hint: Option<String>,
}

/// Playbook listing filter.
#[derive(Deserialize)]
pub struct ListQuery {
    pub topic_id: Option<i64>,
}

/// Playbook detail with ordered steps.
#[derive(Serialize)]
pub struct PlaybookDetail {
    #[serde(flatten)]
    pub playbook: Playbook,
    pub steps: Vec<PlaybookStep>,
}

/// Body for a suggestion query.
#[derive(Deserialize)]
pub struct SuggestRequest {
    pub query: String,
    #[serde(default)]
    pub topic: Option<String>,
}

/// Suggestion result. `no_match` is a normal outcome, not an error.
#[derive(Serialize)]
pub struct SuggestResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<StepRecommendation>,
    pub no_match: bool,
}

/// List all topics.
pub async fn list_topics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Topic>>> {
    auth::check(&headers, &state.api_token)?;
    Ok(Json(playbook_store::list_topics(state.db.pool()).await?))
}

/// Create a topic.
pub async fn create_topic(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateTopicRequest>,
) -> Result<Json<Topic>> {
    auth::check(&headers, &state.api_token)?;
    let topic = playbook_store::create_topic(state.db.pool(), &req.slug, &req.title).await?;
    Ok(Json(topic))
}

/// Delete a topic.
pub async fn delete_topic(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    auth::check(&headers, &state.api_token)?;
    playbook_store::delete_topic(state.db.pool(), id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// List playbooks, optionally by topic.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Playbook>>> {
    auth::check(&headers, &state.api_token)?;
    Ok(Json(
        playbook_store::list_playbooks(state.db.pool(), query.topic_id).await?,
    ))
}

/// Create a playbook.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreatePlaybookRequest>,
) -> Result<Json<Playbook>> {
    auth::check(&headers, &state.api_token)?;

    let pool = state.db.pool();
    let id = Uuid::new_v4().to_string();
    playbook_store::create_playbook(
        pool,
        &id,
        req.topic_id,
        &req.title,
        req.description.as_deref(),
    )
    .await?;

    Ok(Json(playbook_store::get_playbook(pool, &id).await?))
}

/// Get a playbook with its steps.
pub async fn detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<PlaybookDetail>> {
    auth::check(&headers, &state.api_token)?;

    let pool = state.db.pool();
    let playbook = playbook_store::get_playbook(pool, &id).await?;
    let steps = playbook_store::steps_for_playbook(pool, &id).await?;

    Ok(Json(PlaybookDetail { playbook, steps }))
}

/// Delete a playbook with its steps and embedding record.
pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    auth::check(&headers, &state.api_token)?;
    playbook_store::delete_playbook(state.db.pool(), &id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// Append a step. Step order is assigned sequentially by the store.
///
/// Also refreshes the local embedding record so the indexer can tell
/// the playbook text changed since it was last pushed.
pub async fn append_step(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<AppendStepRequest>,
) -> Result<Json<PlaybookStep>> {
    auth::check(&headers, &state.api_token)?;

    let pool = state.db.pool();
    let step =
        playbook_store::append_step(pool, &id, &req.content, req.context_hint.as_deref()).await?;

    // Best-effort: record the new content digest. Push to the external
    // index happens out of band; a failure here only delays re-indexing.
    match playbook_digest(&state, &id).await {
        Ok(digest) => {
            if let Err(e) = playbook_store::upsert_embedding(pool, &id, &id, &digest).await {
                warn!(playbook_id = %id, "Failed to record embedding digest: {}", e);
            }
        }
        Err(e) => warn!(playbook_id = %id, "Failed to compute playbook digest: {}", e),
    }

    Ok(Json(step))
}

/// Recommend a playbook step for a query, or report no match.
pub async fn suggest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SuggestRequest>,
) -> Result<Json<SuggestResponse>> {
    auth::check(&headers, &state.api_token)?;

    let recommendation = match state.selector.as_ref() {
        Some(selector) => selector.select(&req.query, req.topic.as_deref()).await?,
        None => {
            // No index configured: same outcome as an unreachable one.
            warn!("Playbook suggestion requested but no semantic index is configured");
            None
        }
    };

    let no_match = recommendation.is_none();
    Ok(Json(SuggestResponse {
        recommendation,
        no_match,
    }))
}

/// Digest of a playbook's full text (title, description, step contents).
async fn playbook_digest(state: &AppState, playbook_id: &str) -> Result<String> {
    let pool = state.db.pool();
    let playbook = playbook_store::get_playbook(pool, playbook_id).await?;
    let steps = playbook_store::steps_for_playbook(pool, playbook_id).await?;

    let mut hasher = Sha256::new();
    hasher.update(playbook.title.as_bytes());
    if let Some(ref description) = playbook.description {
        hasher.update(description.as_bytes());
    }
    for step in steps {
        hasher.update(step.content.as_bytes());
    }

    Ok(format!("{:x}", hasher.finalize()))
}
