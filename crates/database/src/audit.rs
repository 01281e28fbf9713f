//! Audit-log persistence.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::AuditLogEntry;

/// Record a value change on an entity.
pub async fn record(
    pool: &SqlitePool,
    actor: &str,
    entity_type: &str,
    entity_id: &str,
    old_value: &str,
    new_value: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_log (actor, entity_type, entity_id, old_value, new_value)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(actor)
    .bind(entity_type)
    .bind(entity_id)
    .bind(old_value)
    .bind(new_value)
    .execute(pool)
    .await?;

    Ok(())
}

/// List audit entries for an entity, oldest first.
pub async fn list_for_entity(
    pool: &SqlitePool,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<AuditLogEntry>> {
    let entries = sqlx::query_as::<_, AuditLogEntry>(
        r#"
        SELECT id, actor, entity_type, entity_id, old_value, new_value, created_at
        FROM audit_log
        WHERE entity_type = ? AND entity_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(entity_type)
    .bind(entity_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Count audit entries for an entity.
pub async fn count_for_entity(
    pool: &SqlitePool,
    entity_type: &str,
    entity_id: &str,
) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM audit_log
        WHERE entity_type = ? AND entity_id = ?
        "#,
    )
    .bind(entity_type)
    .bind(entity_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
