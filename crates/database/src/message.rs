//! Conversation message persistence. Append-only: there are no update
//! or delete operations on messages.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{ConversationMessage, MessageDirection};

/// Payload fields for a new message beyond plain text.
#[derive(Debug, Clone, Default)]
pub struct MessagePayload {
    /// Audio transcription, if any.
    pub transcription: Option<String>,
    /// Media URL for audio/image/document messages.
    pub media_url: Option<String>,
    /// MIME type of the media.
    pub media_mime_type: Option<String>,
    /// Location latitude.
    pub latitude: Option<f64>,
    /// Location longitude.
    pub longitude: Option<f64>,
}

/// Append a message to a conversation and return its row ID.
pub async fn append_message(
    pool: &SqlitePool,
    conversation_id: &str,
    direction: MessageDirection,
    content: &str,
    payload: &MessagePayload,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO conversation_messages
            (conversation_id, direction, content, transcription,
             media_url, media_mime_type, latitude, longitude)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(conversation_id)
    .bind(direction)
    .bind(content)
    .bind(&payload.transcription)
    .bind(&payload.media_url)
    .bind(&payload.media_mime_type)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Append a plain text message.
pub async fn append_text_message(
    pool: &SqlitePool,
    conversation_id: &str,
    direction: MessageDirection,
    content: &str,
) -> Result<i64> {
    append_message(
        pool,
        conversation_id,
        direction,
        content,
        &MessagePayload::default(),
    )
    .await
}

/// Get a message by ID.
pub async fn get_message(pool: &SqlitePool, id: i64) -> Result<ConversationMessage> {
    sqlx::query_as::<_, ConversationMessage>(
        r#"
        SELECT id, conversation_id, direction, content, transcription,
               media_url, media_mime_type, latitude, longitude, created_at
        FROM conversation_messages
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "ConversationMessage",
        id: id.to_string(),
    })
}

/// List a conversation's messages in chronological order.
pub async fn list_for_conversation(
    pool: &SqlitePool,
    conversation_id: &str,
) -> Result<Vec<ConversationMessage>> {
    let messages = sqlx::query_as::<_, ConversationMessage>(
        r#"
        SELECT id, conversation_id, direction, content, transcription,
               media_url, media_mime_type, latitude, longitude, created_at
        FROM conversation_messages
        WHERE conversation_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// Timestamp of a conversation's most recent message, if it has any.
///
/// The re-engagement sweep calls this immediately before sending so that
/// a reply arriving after the scan suppresses the send.
pub async fn latest_timestamp(
    pool: &SqlitePool,
    conversation_id: &str,
) -> Result<Option<String>> {
    let timestamp = sqlx::query_scalar::<_, Option<String>>(
        r#"
        SELECT MAX(created_at)
        FROM conversation_messages
        WHERE conversation_id = ?
        "#,
    )
    .bind(conversation_id)
    .fetch_one(pool)
    .await?;

    Ok(timestamp)
}

/// Count messages in a conversation.
pub async fn count_for_conversation(pool: &SqlitePool, conversation_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM conversation_messages
        WHERE conversation_id = ?
        "#,
    )
    .bind(conversation_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
