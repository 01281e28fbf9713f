//! Route handlers for the API server.

pub mod conversations;
pub mod health;
pub mod jobs;
pub mod leads;
pub mod notifications;
pub mod operators;
pub mod playbooks;
pub mod tags;
pub mod webhook;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Gateway webhook
        .route("/webhook/whatsapp", post(webhook::inbound))
        // Conversations and lifecycle
        .route("/api/conversations", get(conversations::list))
        .route("/api/conversations/:id", get(conversations::detail))
        .route("/api/conversations/:id/handoff", post(conversations::handoff))
        .route("/api/conversations/:id/escalate", post(conversations::escalate))
        .route("/api/conversations/:id/claim", post(conversations::claim))
        .route("/api/conversations/:id/complete", post(conversations::complete))
        .route("/api/conversations/:id/release", post(conversations::release))
        .route("/api/conversations/:id/close", post(conversations::close))
        .route("/api/conversations/:id/messages", post(conversations::send_message))
        .route("/api/conversations/:id/urgency", put(conversations::set_urgency))
        .route("/api/conversations/:id/notes", put(conversations::set_notes))
        .route(
            "/api/conversations/:id/tags/:tag_id",
            post(conversations::attach_tag).delete(conversations::detach_tag),
        )
        .route("/api/conversations/:id/audit", get(conversations::audit_trail))
        // Leads
        .route("/api/leads", get(leads::list).post(leads::create))
        .route(
            "/api/leads/:id",
            get(leads::detail).put(leads::update).delete(leads::remove),
        )
        .route("/api/leads/:id/maturity", put(leads::set_maturity))
        // Operators
        .route("/api/operators", get(operators::list).post(operators::create))
        .route("/api/operators/:id/active", put(operators::set_active))
        // Tags
        .route("/api/tags", get(tags::list).post(tags::create))
        .route("/api/tags/:id", delete(tags::remove))
        // Topics and playbooks
        .route("/api/topics", get(playbooks::list_topics).post(playbooks::create_topic))
        .route("/api/topics/:id", delete(playbooks::delete_topic))
        .route("/api/playbooks", get(playbooks::list).post(playbooks::create))
        .route("/api/playbooks/suggest", post(playbooks::suggest))
        .route("/api/playbooks/:id", get(playbooks::detail).delete(playbooks::remove))
        .route("/api/playbooks/:id/steps", post(playbooks::append_step))
        // Notifications
        .route("/api/notifications/:user_id", get(notifications::list))
        .route("/api/notifications/:id/read", post(notifications::mark_read))
        // Jobs
        .route("/api/jobs/reengage", post(jobs::reengage))
}
