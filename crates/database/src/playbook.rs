//! Topic, playbook, step, and embedding-record persistence.
//!
//! Step ordering is the one invariant enforced here: `step_order` is
//! unique and sequential (1..=n) within a playbook. Appends assign
//! `max + 1`; explicit orders must equal `max + 1`. The schema backs
//! this with `UNIQUE(playbook_id, step_order)`.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Playbook, PlaybookEmbedding, PlaybookStep, Topic};

/// Create a new topic and return it.
pub async fn create_topic(pool: &SqlitePool, slug: &str, title: &str) -> Result<Topic> {
    let result = sqlx::query(
        r#"
        INSERT INTO topics (slug, title)
        VALUES (?, ?)
        "#,
    )
    .bind(slug)
    .bind(title)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Topic",
                    id: slug.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(Topic {
        id: result.last_insert_rowid(),
        slug: slug.to_string(),
        title: title.to_string(),
    })
}

/// Get a topic by slug.
pub async fn get_topic_by_slug(pool: &SqlitePool, slug: &str) -> Result<Topic> {
    sqlx::query_as::<_, Topic>(
        r#"
        SELECT id, slug, title
        FROM topics
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Topic",
        id: slug.to_string(),
    })
}

/// List all topics.
pub async fn list_topics(pool: &SqlitePool) -> Result<Vec<Topic>> {
    let topics = sqlx::query_as::<_, Topic>(
        r#"
        SELECT id, slug, title
        FROM topics
        ORDER BY slug
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(topics)
}

/// Delete a topic. Fails while playbooks still reference it.
pub async fn delete_topic(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM topics WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Topic",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Create a new playbook under a topic.
pub async fn create_playbook(
    pool: &SqlitePool,
    id: &str,
    topic_id: i64,
    title: &str,
    description: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO playbooks (id, topic_id, title, description)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(topic_id)
    .bind(title)
    .bind(description)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Playbook",
                    id: id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a playbook by ID.
pub async fn get_playbook(pool: &SqlitePool, id: &str) -> Result<Playbook> {
    sqlx::query_as::<_, Playbook>(
        r#"
        SELECT id, topic_id, title, description, created_at
        FROM playbooks
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Playbook",
        id: id.to_string(),
    })
}

/// List playbooks, optionally restricted to one topic.
pub async fn list_playbooks(pool: &SqlitePool, topic_id: Option<i64>) -> Result<Vec<Playbook>> {
    let playbooks = match topic_id {
        Some(topic_id) => {
            sqlx::query_as::<_, Playbook>(
                r#"
                SELECT id, topic_id, title, description, created_at
                FROM playbooks
                WHERE topic_id = ?
                ORDER BY title
                "#,
            )
            .bind(topic_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Playbook>(
                r#"
                SELECT id, topic_id, title, description, created_at
                FROM playbooks
                ORDER BY title
                "#,
            )
            .fetch_all(pool)
            .await?
        }
    };

    Ok(playbooks)
}

/// Delete a playbook with its steps and embedding record.
pub async fn delete_playbook(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM playbook_steps WHERE playbook_id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM playbook_embeddings WHERE playbook_id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    let result = sqlx::query("DELETE FROM playbooks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Playbook",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Append a step to a playbook, assigning the next sequential order.
pub async fn append_step(
    pool: &SqlitePool,
    playbook_id: &str,
    content: &str,
    context_hint: Option<&str>,
) -> Result<PlaybookStep> {
    // Existence check first so a missing playbook is NotFound, not a
    // foreign-key failure.
    get_playbook(pool, playbook_id).await?;

    let next_order = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(MAX(step_order), 0) + 1
        FROM playbook_steps
        WHERE playbook_id = ?
        "#,
    )
    .bind(playbook_id)
    .fetch_one(pool)
    .await?;

    let result = sqlx::query(
        r#"
        INSERT INTO playbook_steps (playbook_id, step_order, content, context_hint)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(playbook_id)
    .bind(next_order)
    .bind(content)
    .bind(context_hint)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                // Concurrent append took this slot.
                return DatabaseError::AlreadyExists {
                    entity: "PlaybookStep",
                    id: format!("{}/{}", playbook_id, next_order),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(PlaybookStep {
        id: result.last_insert_rowid(),
        playbook_id: playbook_id.to_string(),
        step_order: next_order,
        content: content.to_string(),
        context_hint: context_hint.map(|s| s.to_string()),
    })
}

/// List a playbook's steps in order.
pub async fn steps_for_playbook(pool: &SqlitePool, playbook_id: &str) -> Result<Vec<PlaybookStep>> {
    let steps = sqlx::query_as::<_, PlaybookStep>(
        r#"
        SELECT id, playbook_id, step_order, content, context_hint
        FROM playbook_steps
        WHERE playbook_id = ?
        ORDER BY step_order ASC
        "#,
    )
    .bind(playbook_id)
    .fetch_all(pool)
    .await?;

    Ok(steps)
}

/// Record (or refresh) the external-index document for a playbook.
pub async fn upsert_embedding(
    pool: &SqlitePool,
    playbook_id: &str,
    document_id: &str,
    digest: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO playbook_embeddings (playbook_id, document_id, digest, indexed_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(playbook_id) DO UPDATE SET
            document_id = excluded.document_id,
            digest = excluded.digest,
            indexed_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(playbook_id)
    .bind(document_id)
    .bind(digest)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get the embedding record for a playbook, if it has been indexed.
pub async fn get_embedding(
    pool: &SqlitePool,
    playbook_id: &str,
) -> Result<Option<PlaybookEmbedding>> {
    let embedding = sqlx::query_as::<_, PlaybookEmbedding>(
        r#"
        SELECT playbook_id, document_id, digest, indexed_at
        FROM playbook_embeddings
        WHERE playbook_id = ?
        "#,
    )
    .bind(playbook_id)
    .fetch_optional(pool)
    .await?;

    Ok(embedding)
}
