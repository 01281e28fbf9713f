//! Tag CRUD and conversation-tag associations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{ConversationTag, Tag};

/// Create a new tag and return it.
pub async fn create_tag(pool: &SqlitePool, name: &str, color: &str) -> Result<Tag> {
    let result = sqlx::query(
        r#"
        INSERT INTO tags (name, color)
        VALUES (?, ?)
        "#,
    )
    .bind(name)
    .bind(color)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Tag",
                    id: name.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(Tag {
        id: result.last_insert_rowid(),
        name: name.to_string(),
        color: color.to_string(),
    })
}

/// Get a tag by ID.
pub async fn get_tag(pool: &SqlitePool, id: i64) -> Result<Tag> {
    sqlx::query_as::<_, Tag>(
        r#"
        SELECT id, name, color
        FROM tags
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Tag",
        id: id.to_string(),
    })
}

/// Delete a tag and its associations.
pub async fn delete_tag(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM conversation_tags WHERE tag_id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    let result = sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Tag",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List all tags.
pub async fn list_tags(pool: &SqlitePool) -> Result<Vec<Tag>> {
    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT id, name, color
        FROM tags
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(tags)
}

/// Attach a tag to a conversation.
pub async fn attach_tag(pool: &SqlitePool, conversation_id: &str, tag_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO conversation_tags (conversation_id, tag_id)
        VALUES (?, ?)
        "#,
    )
    .bind(conversation_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "ConversationTag",
                    id: format!("{}/{}", conversation_id, tag_id),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Detach a tag from a conversation.
pub async fn detach_tag(pool: &SqlitePool, conversation_id: &str, tag_id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM conversation_tags
        WHERE conversation_id = ? AND tag_id = ?
        "#,
    )
    .bind(conversation_id)
    .bind(tag_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "ConversationTag",
            id: format!("{}/{}", conversation_id, tag_id),
        });
    }

    Ok(())
}

/// Get all tags attached to a conversation.
pub async fn tags_for_conversation(pool: &SqlitePool, conversation_id: &str) -> Result<Vec<Tag>> {
    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.id, t.name, t.color
        FROM tags t
        INNER JOIN conversation_tags ct ON ct.tag_id = t.id
        WHERE ct.conversation_id = ?
        ORDER BY t.name
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(tags)
}

/// List raw associations for a conversation (with creation timestamps).
pub async fn associations_for_conversation(
    pool: &SqlitePool,
    conversation_id: &str,
) -> Result<Vec<ConversationTag>> {
    let associations = sqlx::query_as::<_, ConversationTag>(
        r#"
        SELECT conversation_id, tag_id, created_at
        FROM conversation_tags
        WHERE conversation_id = ?
        ORDER BY created_at ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(associations)
}
