//! Notification persistence. Rows are created by the lifecycle manager
//! and other triggers; the only mutation is flipping `read`.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Notification;

/// Create a notification for a user and return its row ID.
pub async fn create_notification(
    pool: &SqlitePool,
    user_id: &str,
    kind: &str,
    title: &str,
    body: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO notifications (user_id, kind, title, body)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(kind)
    .bind(title)
    .bind(body)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Mark a notification as read.
pub async fn mark_read(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET read = 1
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Notification",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List a user's notifications, newest first.
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
    unread_only: bool,
) -> Result<Vec<Notification>> {
    let sql = if unread_only {
        r#"
        SELECT id, user_id, kind, title, body, read, created_at
        FROM notifications
        WHERE user_id = ? AND read = 0
        ORDER BY created_at DESC
        "#
    } else {
        r#"
        SELECT id, user_id, kind, title, body, read, created_at
        FROM notifications
        WHERE user_id = ?
        ORDER BY created_at DESC
        "#
    };

    let notifications = sqlx::query_as::<_, Notification>(sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(notifications)
}

/// Count a user's unread notifications.
pub async fn count_unread(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM notifications
        WHERE user_id = ? AND read = 0
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
