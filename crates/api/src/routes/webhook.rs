//! Inbound message intake from the WhatsApp gateway.
//!
//! The gateway POSTs every message a lead sends. Intake finds or
//! creates the lead by phone, finds or creates an open conversation,
//! appends the message, and clears the re-engagement marker so the
//! sweep knows the lead replied.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use whatsapp_gateway::{InboundBody, InboundPayload};

use database::models::Lead;
use database::{conversation, lead, message, DatabaseError, MessageDirection, MessagePayload};

use crate::auth;
use crate::error::Result;
use crate::state::AppState;

/// Intake response.
#[derive(Serialize)]
pub struct InboundResponse {
    pub lead_id: String,
    pub conversation_id: String,
    pub message_id: i64,
}

/// Handle one inbound message from the gateway.
pub async fn inbound(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<InboundPayload>,
) -> Result<Json<InboundResponse>> {
    auth::check(&headers, &state.api_token)?;

    let pool = state.db.pool();

    let lead = find_or_create_lead(&state, &payload).await?;

    let conversation = match conversation::find_open_for_lead(pool, &lead.id).await? {
        Some(conversation) => conversation,
        None => {
            let id = Uuid::new_v4().to_string();
            conversation::create_conversation(pool, &id, &lead.id).await?;
            info!(lead_id = %lead.id, conversation_id = %id, "Opened conversation");
            conversation::get_conversation(pool, &id).await?
        }
    };

    let (content, message_payload) = map_body(&payload.body);
    let message_id = message::append_message(
        pool,
        &conversation.id,
        MessageDirection::Inbound,
        &content,
        &message_payload,
    )
    .await?;

    // The lead replied: the re-engagement marker no longer applies.
    conversation::clear_awaiting_reply(pool, &conversation.id).await?;

    info!(
        lead_id = %lead.id,
        conversation_id = %conversation.id,
        message_id,
        "Inbound message stored"
    );

    Ok(Json(InboundResponse {
        lead_id: lead.id,
        conversation_id: conversation.id,
        message_id,
    }))
}

/// Resolve the sender to a lead, creating one on first contact.
async fn find_or_create_lead(state: &AppState, payload: &InboundPayload) -> Result<Lead> {
    let pool = state.db.pool();

    match lead::get_lead_by_phone(pool, &payload.from).await {
        Ok(lead) => Ok(lead),
        Err(DatabaseError::NotFound { .. }) => {
            let new_lead = Lead {
                id: Uuid::new_v4().to_string(),
                phone: payload.from.clone(),
                name: payload
                    .profile_name
                    .clone()
                    .unwrap_or_else(|| payload.from.clone()),
                email: None,
                maturity_score: 0,
                assigned_operator_id: None,
                deleted_at: None,
                created_at: String::new(),
                updated_at: String::new(),
            };

            match lead::create_lead(pool, &new_lead).await {
                Ok(()) => {
                    info!(lead_id = %new_lead.id, "Created lead on first contact");
                    Ok(lead::get_lead(pool, &new_lead.id).await?)
                }
                // Two messages from a brand-new number racing: the other
                // intake created the lead first.
                Err(DatabaseError::AlreadyExists { .. }) => {
                    Ok(lead::get_lead_by_phone(pool, &payload.from).await?)
                }
                Err(e) => Err(e.into()),
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Map a gateway payload body onto message content and columns.
fn map_body(body: &InboundBody) -> (String, MessagePayload) {
    match body {
        InboundBody::Text { body } => (body.clone(), MessagePayload::default()),
        InboundBody::Audio {
            media_url,
            mime_type,
            transcription,
        } => (
            String::new(),
            MessagePayload {
                transcription: transcription.clone(),
                media_url: Some(media_url.clone()),
                media_mime_type: Some(mime_type.clone()),
                ..Default::default()
            },
        ),
        InboundBody::Media {
            media_url,
            mime_type,
            caption,
        } => (
            caption.clone().unwrap_or_default(),
            MessagePayload {
                media_url: Some(media_url.clone()),
                media_mime_type: Some(mime_type.clone()),
                ..Default::default()
            },
        ),
        InboundBody::Location {
            latitude,
            longitude,
        } => (
            String::new(),
            MessagePayload {
                latitude: Some(*latitude),
                longitude: Some(*longitude),
                ..Default::default()
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_text_body() {
        let (content, payload) = map_body(&InboundBody::Text {
            body: "hello".to_string(),
        });
        assert_eq!(content, "hello");
        assert!(payload.media_url.is_none());
    }

    #[test]
    fn test_map_audio_body() {
        let (content, payload) = map_body(&InboundBody::Audio {
            media_url: "https://cdn.example.com/a.ogg".to_string(),
            mime_type: "audio/ogg".to_string(),
            transcription: Some("call me back".to_string()),
        });
        assert!(content.is_empty());
        assert_eq!(payload.transcription.as_deref(), Some("call me back"));
        assert_eq!(payload.media_mime_type.as_deref(), Some("audio/ogg"));
    }

    #[test]
    fn test_map_location_body() {
        let (content, payload) = map_body(&InboundBody::Location {
            latitude: -23.5,
            longitude: -46.6,
        });
        assert!(content.is_empty());
        assert_eq!(payload.latitude, Some(-23.5));
        assert_eq!(payload.longitude, Some(-46.6));
    }
}
