//! Lead CRUD operations.
//!
//! Leads are soft-deleted only: `soft_delete_lead` stamps `deleted_at`,
//! default listings exclude stamped rows, and `get_lead` keeps returning
//! them so audit trails stay resolvable.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Lead;
use crate::validation::{validate_email, validate_maturity_score, validate_phone};

/// Create a new lead.
pub async fn create_lead(pool: &SqlitePool, lead: &Lead) -> Result<()> {
    validate_phone(&lead.phone)?;
    if let Some(ref email) = lead.email {
        validate_email(email)?;
    }
    validate_maturity_score(lead.maturity_score)?;

    sqlx::query(
        r#"
        INSERT INTO leads (id, phone, name, email, maturity_score, assigned_operator_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&lead.id)
    .bind(&lead.phone)
    .bind(&lead.name)
    .bind(&lead.email)
    .bind(lead.maturity_score)
    .bind(&lead.assigned_operator_id)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Lead",
                    id: lead.phone.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a lead by ID. Returns soft-deleted leads too.
pub async fn get_lead(pool: &SqlitePool, id: &str) -> Result<Lead> {
    sqlx::query_as::<_, Lead>(
        r#"
        SELECT id, phone, name, email, maturity_score, assigned_operator_id,
               deleted_at, created_at, updated_at
        FROM leads
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Lead",
        id: id.to_string(),
    })
}

/// Get a non-deleted lead by phone number.
pub async fn get_lead_by_phone(pool: &SqlitePool, phone: &str) -> Result<Lead> {
    sqlx::query_as::<_, Lead>(
        r#"
        SELECT id, phone, name, email, maturity_score, assigned_operator_id,
               deleted_at, created_at, updated_at
        FROM leads
        WHERE phone = ? AND deleted_at IS NULL
        "#,
    )
    .bind(phone)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Lead",
        id: phone.to_string(),
    })
}

/// Update a lead's name and email.
pub async fn update_lead(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    email: Option<&str>,
) -> Result<()> {
    if let Some(email) = email {
        validate_email(email)?;
    }

    let result = sqlx::query(
        r#"
        UPDATE leads
        SET name = ?, email = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Lead",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Set a lead's maturity score (0-100).
pub async fn set_maturity_score(pool: &SqlitePool, id: &str, score: i64) -> Result<()> {
    validate_maturity_score(score)?;

    let result = sqlx::query(
        r#"
        UPDATE leads
        SET maturity_score = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(score)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Lead",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Assign (or unassign, with `None`) an operator to a lead.
pub async fn assign_operator(
    pool: &SqlitePool,
    id: &str,
    operator_id: Option<&str>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE leads
        SET assigned_operator_id = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(operator_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Lead",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Soft-delete a lead. Idempotent calls on an already-deleted lead fail
/// with `NotFound` since the row no longer matches the live predicate.
pub async fn soft_delete_lead(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE leads
        SET deleted_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Lead",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List all non-deleted leads, newest first.
pub async fn list_leads(pool: &SqlitePool) -> Result<Vec<Lead>> {
    let leads = sqlx::query_as::<_, Lead>(
        r#"
        SELECT id, phone, name, email, maturity_score, assigned_operator_id,
               deleted_at, created_at, updated_at
        FROM leads
        WHERE deleted_at IS NULL
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(leads)
}

/// List non-deleted leads assigned to an operator.
pub async fn list_leads_for_operator(pool: &SqlitePool, operator_id: &str) -> Result<Vec<Lead>> {
    let leads = sqlx::query_as::<_, Lead>(
        r#"
        SELECT id, phone, name, email, maturity_score, assigned_operator_id,
               deleted_at, created_at, updated_at
        FROM leads
        WHERE assigned_operator_id = ? AND deleted_at IS NULL
        ORDER BY created_at DESC
        "#,
    )
    .bind(operator_id)
    .fetch_all(pool)
    .await?;

    Ok(leads)
}

/// Count non-deleted leads.
pub async fn count_leads(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM leads WHERE deleted_at IS NULL
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
