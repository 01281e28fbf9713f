//! Conversation persistence, including the guarded status update used
//! for lifecycle transitions.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Conversation, ConversationStatus};

const SELECT_COLUMNS: &str = r#"
    SELECT id, lead_id, status, is_urgent, notes, awaiting_reply,
           created_at, updated_at
    FROM conversations
"#;

/// Create a new conversation for a lead. Initial status is `ACTIVE_BOT`.
pub async fn create_conversation(pool: &SqlitePool, id: &str, lead_id: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO conversations (id, lead_id, status)
        VALUES (?, ?, 'ACTIVE_BOT')
        "#,
    )
    .bind(id)
    .bind(lead_id)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Conversation",
                    id: id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a conversation by ID.
pub async fn get_conversation(pool: &SqlitePool, id: &str) -> Result<Conversation> {
    sqlx::query_as::<_, Conversation>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Conversation",
            id: id.to_string(),
        })
}

/// Update a conversation's status only if it still has the expected one.
///
/// Returns `false` when the row no longer matches `expected` (another
/// writer got there first). This conditional update is the concurrency
/// guard for claims and every other lifecycle transition; callers decide
/// how to surface a lost race.
pub async fn update_status_if(
    pool: &SqlitePool,
    id: &str,
    expected: ConversationStatus,
    new: ConversationStatus,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET status = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(new)
    .bind(id)
    .bind(expected)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Find the most recent conversation for a lead that is still open
/// (not `COMPLETED`/`CLOSED`), if any.
pub async fn find_open_for_lead(pool: &SqlitePool, lead_id: &str) -> Result<Option<Conversation>> {
    let conversation = sqlx::query_as::<_, Conversation>(&format!(
        r#"{}
        WHERE lead_id = ? AND status NOT IN ('COMPLETED', 'CLOSED')
        ORDER BY created_at DESC
        LIMIT 1
        "#,
        SELECT_COLUMNS
    ))
    .bind(lead_id)
    .fetch_optional(pool)
    .await?;

    Ok(conversation)
}

/// Set the urgency flag. Independent of status.
pub async fn set_urgency(pool: &SqlitePool, id: &str, is_urgent: bool) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET is_urgent = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(is_urgent)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Conversation",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Replace the free-text notes.
pub async fn set_notes(pool: &SqlitePool, id: &str, notes: Option<&str>) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET notes = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(notes)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Conversation",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Set the `awaiting_reply` marker, guarded on it being clear.
///
/// Returns `false` if the marker was already set (a concurrent sweep won
/// the race). Same optimistic pattern as [`update_status_if`].
pub async fn mark_awaiting_reply_if_clear(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET awaiting_reply = 1, updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND awaiting_reply = 0
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Clear the `awaiting_reply` marker (on an inbound reply, or to undo a
/// failed re-engagement send).
pub async fn clear_awaiting_reply(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE conversations
        SET awaiting_reply = 0, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// List conversations in a given status, newest first.
pub async fn list_by_status(
    pool: &SqlitePool,
    status: ConversationStatus,
) -> Result<Vec<Conversation>> {
    let conversations = sqlx::query_as::<_, Conversation>(&format!(
        r#"{}
        WHERE status = ?
        ORDER BY created_at DESC
        "#,
        SELECT_COLUMNS
    ))
    .bind(status)
    .fetch_all(pool)
    .await?;

    Ok(conversations)
}

/// List all conversations, optionally filtered to urgent ones.
pub async fn list_all(pool: &SqlitePool, urgent_only: bool) -> Result<Vec<Conversation>> {
    let sql = if urgent_only {
        format!("{} WHERE is_urgent = 1 ORDER BY created_at DESC", SELECT_COLUMNS)
    } else {
        format!("{} ORDER BY created_at DESC", SELECT_COLUMNS)
    };

    let conversations = sqlx::query_as::<_, Conversation>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(conversations)
}

/// List conversations in `status`, marker clear, whose most recent
/// message (or creation, when no messages exist) predates `older_than`.
///
/// `older_than` is a UTC timestamp in the same `YYYY-MM-DD HH:MM:SS`
/// form SQLite's `CURRENT_TIMESTAMP` writes, so text comparison is
/// chronological.
pub async fn list_stale_by_status(
    pool: &SqlitePool,
    status: ConversationStatus,
    older_than: &str,
) -> Result<Vec<Conversation>> {
    let conversations = sqlx::query_as::<_, Conversation>(&format!(
        r#"{}
        WHERE status = ?
          AND awaiting_reply = 0
          AND COALESCE(
                (SELECT MAX(m.created_at)
                 FROM conversation_messages m
                 WHERE m.conversation_id = conversations.id),
                created_at
              ) < ?
        ORDER BY created_at ASC
        "#,
        SELECT_COLUMNS
    ))
    .bind(status)
    .bind(older_than)
    .fetch_all(pool)
    .await?;

    Ok(conversations)
}

/// Count conversations grouped by status.
pub async fn count_by_status(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT status, COUNT(*) as count
        FROM conversations
        GROUP BY status
        ORDER BY count DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
