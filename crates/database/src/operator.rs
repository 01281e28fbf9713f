//! Operator CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Operator;
use crate::validation::validate_email;

/// Create a new operator.
pub async fn create_operator(pool: &SqlitePool, operator: &Operator) -> Result<()> {
    validate_email(&operator.email)?;

    sqlx::query(
        r#"
        INSERT INTO operators (id, name, email, active)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&operator.id)
    .bind(&operator.name)
    .bind(&operator.email)
    .bind(operator.active)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Operator",
                    id: operator.email.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get an operator by ID.
pub async fn get_operator(pool: &SqlitePool, id: &str) -> Result<Operator> {
    sqlx::query_as::<_, Operator>(
        r#"
        SELECT id, name, email, active, created_at
        FROM operators
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Operator",
        id: id.to_string(),
    })
}

/// Set whether an operator is active.
pub async fn set_active(pool: &SqlitePool, id: &str, active: bool) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE operators
        SET active = ?
        WHERE id = ?
        "#,
    )
    .bind(active)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Operator",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List all operators.
pub async fn list_operators(pool: &SqlitePool) -> Result<Vec<Operator>> {
    let operators = sqlx::query_as::<_, Operator>(
        r#"
        SELECT id, name, email, active, created_at
        FROM operators
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(operators)
}

/// List active operators (the notification audience for handoffs).
pub async fn list_active_operators(pool: &SqlitePool) -> Result<Vec<Operator>> {
    let operators = sqlx::query_as::<_, Operator>(
        r#"
        SELECT id, name, email, active, created_at
        FROM operators
        WHERE active = 1
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(operators)
}
