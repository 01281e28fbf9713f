//! Error types for the API server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use lifecycle::LifecycleError;
use playbook::SelectorError;
use thiserror::Error;
use whatsapp_gateway::GatewayError;

/// Errors that can occur in API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Lifecycle error.
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Playbook selector error.
    #[error("Selector error: {0}")]
    Selector(#[from] SelectorError),

    /// WhatsApp gateway error.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Missing or wrong bearer token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed request.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

fn database_status(err: &DatabaseError) -> StatusCode {
    match err {
        DatabaseError::NotFound { .. } => StatusCode::NOT_FOUND,
        DatabaseError::AlreadyExists { .. } => StatusCode::CONFLICT,
        DatabaseError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Database(err) => database_status(err),
            ApiError::Lifecycle(err) => match err {
                LifecycleError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                LifecycleError::AlreadyClaimed { .. } => StatusCode::CONFLICT,
                LifecycleError::Persistence(inner) => database_status(inner),
                LifecycleError::Send { .. } => StatusCode::BAD_GATEWAY,
            },
            ApiError::Selector(SelectorError::Persistence(inner)) => database_status(inner),
            ApiError::Gateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!("{}", message);
        } else {
            tracing::debug!("{}", message);
        }

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use database::ConversationStatus;

    #[test]
    fn test_status_mapping() {
        let err = ApiError::Lifecycle(LifecycleError::InvalidTransition {
            conversation_id: "conv-1".to_string(),
            from: ConversationStatus::ActiveBot,
            to: ConversationStatus::Completed,
        });
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = ApiError::Lifecycle(LifecycleError::AlreadyClaimed {
            conversation_id: "conv-1".to_string(),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = ApiError::Database(DatabaseError::NotFound {
            entity: "Lead",
            id: "x".to_string(),
        });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::Unauthorized;
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
