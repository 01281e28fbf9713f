//! Static bearer-token authorization.

use axum::http::HeaderMap;

use crate::error::{ApiError, Result};

/// Check the `Authorization: Bearer <token>` header against the
/// configured API token. When no token is configured the API is open
/// (development mode).
pub fn check(headers: &HeaderMap, expected: &Option<String>) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let presented = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}
