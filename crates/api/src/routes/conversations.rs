//! Conversation listing, detail, and lifecycle routes.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use database::models::{
    AuditLogEntry, Conversation, ConversationMessage, ConversationStatus, MessageDirection, Tag,
};
use database::{audit, conversation, lead, message, tag};
use whatsapp_gateway::GatewayError;

use crate::auth;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Listing filters.
#[derive(Deserialize)]
pub struct ListQuery {
    /// Status filter; accepts legacy aliases (`ACTIVE`, `PENDING`).
    pub status: Option<String>,
    /// Only urgent conversations.
    #[serde(default)]
    pub urgent: bool,
}

/// Conversation detail with messages and tags.
#[derive(Serialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<ConversationMessage>,
    pub tags: Vec<Tag>,
}

/// Body naming the acting operator (or "bot"/"system").
#[derive(Deserialize)]
pub struct ActorRequest {
    pub actor: String,
}

/// Body naming the claiming operator.
#[derive(Deserialize)]
pub struct ClaimRequest {
    pub operator_id: String,
}

/// Body for the urgency flag.
#[derive(Deserialize)]
pub struct UrgencyRequest {
    pub is_urgent: bool,
}

/// Body for notes updates.
#[derive(Deserialize)]
pub struct NotesRequest {
    pub notes: Option<String>,
}

/// Body for an operator-sent message.
#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

/// List conversations, optionally filtered by status and urgency.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Conversation>>> {
    auth::check(&headers, &state.api_token)?;

    let conversations = match query.status.as_deref() {
        Some(raw) => {
            let status = ConversationStatus::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown status: {}", raw)))?;
            let mut conversations =
                conversation::list_by_status(state.db.pool(), status).await?;
            if query.urgent {
                conversations.retain(|c| c.is_urgent);
            }
            conversations
        }
        None => conversation::list_all(state.db.pool(), query.urgent).await?,
    };

    Ok(Json(conversations))
}

/// Get one conversation with its messages and tags.
pub async fn detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ConversationDetail>> {
    auth::check(&headers, &state.api_token)?;

    let pool = state.db.pool();
    let conversation = conversation::get_conversation(pool, &id).await?;
    let messages = message::list_for_conversation(pool, &id).await?;
    let tags = tag::tags_for_conversation(pool, &id).await?;

    Ok(Json(ConversationDetail {
        conversation,
        messages,
        tags,
    }))
}

/// The bot requests a human takeover.
pub async fn handoff(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<Conversation>> {
    auth::check(&headers, &state.api_token)?;
    let conversation = state.lifecycle.request_handoff(&id, &req.actor).await?;
    Ok(Json(conversation))
}

/// The bot escalates a conversation it cannot handle.
pub async fn escalate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<Conversation>> {
    auth::check(&headers, &state.api_token)?;
    let conversation = state.lifecycle.escalate(&id, &req.actor).await?;
    Ok(Json(conversation))
}

/// An operator claims a pending or escalated conversation.
pub async fn claim(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<Conversation>> {
    auth::check(&headers, &state.api_token)?;
    let conversation = state.lifecycle.claim(&id, &req.operator_id).await?;
    Ok(Json(conversation))
}

/// An operator marks the outcome achieved.
pub async fn complete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<Conversation>> {
    auth::check(&headers, &state.api_token)?;
    let conversation = state.lifecycle.complete(&id, &req.actor).await?;
    Ok(Json(conversation))
}

/// An operator releases the conversation back to the bot.
pub async fn release(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<Conversation>> {
    auth::check(&headers, &state.api_token)?;
    let conversation = state.lifecycle.release_to_bot(&id, &req.actor).await?;
    Ok(Json(conversation))
}

/// An operator or the timeout job closes the conversation.
pub async fn close(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<Conversation>> {
    auth::check(&headers, &state.api_token)?;
    let conversation = state.lifecycle.close(&id, &req.actor).await?;
    Ok(Json(conversation))
}

/// Set the urgency flag.
pub async fn set_urgency(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UrgencyRequest>,
) -> Result<Json<Conversation>> {
    auth::check(&headers, &state.api_token)?;
    let pool = state.db.pool();
    conversation::set_urgency(pool, &id, req.is_urgent).await?;
    Ok(Json(conversation::get_conversation(pool, &id).await?))
}

/// Replace the free-text notes.
pub async fn set_notes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<NotesRequest>,
) -> Result<Json<Conversation>> {
    auth::check(&headers, &state.api_token)?;
    let pool = state.db.pool();
    conversation::set_notes(pool, &id, req.notes.as_deref()).await?;
    Ok(Json(conversation::get_conversation(pool, &id).await?))
}

/// Send a message to the conversation's lead through the gateway and
/// persist it as an outbound conversation message.
pub async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<ConversationMessage>> {
    auth::check(&headers, &state.api_token)?;

    let pool = state.db.pool();
    let conversation = conversation::get_conversation(pool, &id).await?;
    let lead = lead::get_lead(pool, &conversation.lead_id).await?;

    let gateway = state.gateway.as_ref().ok_or_else(|| {
        ApiError::Gateway(GatewayError::Config("gateway not configured".to_string()))
    })?;
    gateway.send_text(&lead.phone, &req.text).await?;

    // Persist only after the gateway accepted the message.
    let message_id =
        message::append_text_message(pool, &id, MessageDirection::Outbound, &req.text).await?;

    Ok(Json(message::get_message(pool, message_id).await?))
}

/// Attach a tag to a conversation.
pub async fn attach_tag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, tag_id)): Path<(String, i64)>,
) -> Result<Json<Vec<Tag>>> {
    auth::check(&headers, &state.api_token)?;
    let pool = state.db.pool();
    // Surface missing rows as 404 before the association insert.
    conversation::get_conversation(pool, &id).await?;
    tag::get_tag(pool, tag_id).await?;
    tag::attach_tag(pool, &id, tag_id).await?;
    Ok(Json(tag::tags_for_conversation(pool, &id).await?))
}

/// Detach a tag from a conversation.
pub async fn detach_tag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, tag_id)): Path<(String, i64)>,
) -> Result<Json<Vec<Tag>>> {
    auth::check(&headers, &state.api_token)?;
    let pool = state.db.pool();
    tag::detach_tag(pool, &id, tag_id).await?;
    Ok(Json(tag::tags_for_conversation(pool, &id).await?))
}

/// Audit trail for a conversation.
pub async fn audit_trail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<AuditLogEntry>>> {
    auth::check(&headers, &state.api_token)?;
    let entries = audit::list_for_entity(state.db.pool(), "conversation", &id).await?;
    Ok(Json(entries))
}
