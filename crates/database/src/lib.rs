//! SQLite persistence layer for Parla.
//!
//! This crate provides async database operations for leads, conversations,
//! messages, tags, notifications, operators, playbooks, and the audit log,
//! using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{lead, models::Lead, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:parla.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create a lead on first inbound contact
//!     let lead = Lead {
//!         id: "5f0c2c4e-dfb0-4a46-9f6b-0e9f38b5b11a".to_string(),
//!         phone: "+5511999887766".to_string(),
//!         name: "Maria".to_string(),
//!         email: None,
//!         maturity_score: 0,
//!         assigned_operator_id: None,
//!         deleted_at: None,
//!         created_at: String::new(),
//!         updated_at: String::new(),
//!     };
//!     lead::create_lead(db.pool(), &lead).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod conversation;
pub mod error;
pub mod lead;
pub mod message;
pub mod models;
pub mod notification;
pub mod operator;
pub mod playbook;
pub mod tag;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use message::MessagePayload;
pub use models::{
    AuditLogEntry, Conversation, ConversationMessage, ConversationStatus, ConversationTag, Lead,
    MessageDirection, Notification, Operator, Playbook, PlaybookEmbedding, PlaybookStep, Tag,
    Topic,
};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Set high enough to handle concurrent webhook intake alongside
    /// operator actions and the re-engagement sweep.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/parla.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn sample_lead(id: &str, phone: &str) -> Lead {
        Lead {
            id: id.to_string(),
            phone: phone.to_string(),
            name: "Maria".to_string(),
            email: Some("maria@example.com".to_string()),
            maturity_score: 10,
            assigned_operator_id: None,
            deleted_at: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[tokio::test]
    async fn test_lead_crud_and_soft_delete() {
        let db = test_db().await;
        let pool = db.pool();

        let lead = sample_lead("lead-1", "+5511999887766");
        lead::create_lead(pool, &lead).await.unwrap();

        // Duplicate phone is rejected
        let dup = sample_lead("lead-2", "+5511999887766");
        let result = lead::create_lead(pool, &dup).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));

        // Read back, by id and by phone
        let fetched = lead::get_lead(pool, "lead-1").await.unwrap();
        assert_eq!(fetched.name, "Maria");
        assert!(!fetched.is_deleted());
        let by_phone = lead::get_lead_by_phone(pool, "+5511999887766").await.unwrap();
        assert_eq!(by_phone.id, "lead-1");

        // Update and score
        lead::update_lead(pool, "lead-1", "Maria Silva", Some("m.silva@example.com"))
            .await
            .unwrap();
        lead::set_maturity_score(pool, "lead-1", 60).await.unwrap();
        let fetched = lead::get_lead(pool, "lead-1").await.unwrap();
        assert_eq!(fetched.name, "Maria Silva");
        assert_eq!(fetched.maturity_score, 60);

        // Score outside 0-100 is rejected
        let result = lead::set_maturity_score(pool, "lead-1", 250).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));

        // Soft delete: gone from listings, still readable by id
        lead::soft_delete_lead(pool, "lead-1").await.unwrap();
        assert!(lead::list_leads(pool).await.unwrap().is_empty());
        let deleted = lead::get_lead(pool, "lead-1").await.unwrap();
        assert!(deleted.is_deleted());
        let result = lead::get_lead_by_phone(pool, "+5511999887766").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_conversation_guarded_status_update() {
        let db = test_db().await;
        let pool = db.pool();

        lead::create_lead(pool, &sample_lead("lead-1", "+5511999887766"))
            .await
            .unwrap();
        conversation::create_conversation(pool, "conv-1", "lead-1")
            .await
            .unwrap();

        let conv = conversation::get_conversation(pool, "conv-1").await.unwrap();
        assert_eq!(conv.status, ConversationStatus::ActiveBot);
        assert!(!conv.is_urgent);
        assert!(!conv.awaiting_reply);

        // Guard matches: update succeeds
        let updated = conversation::update_status_if(
            pool,
            "conv-1",
            ConversationStatus::ActiveBot,
            ConversationStatus::PendingHandoff,
        )
        .await
        .unwrap();
        assert!(updated);

        // Guard no longer matches: update is refused
        let updated = conversation::update_status_if(
            pool,
            "conv-1",
            ConversationStatus::ActiveBot,
            ConversationStatus::Escalated,
        )
        .await
        .unwrap();
        assert!(!updated);

        let conv = conversation::get_conversation(pool, "conv-1").await.unwrap();
        assert_eq!(conv.status, ConversationStatus::PendingHandoff);

        // Urgency is independent of status
        conversation::set_urgency(pool, "conv-1", true).await.unwrap();
        let conv = conversation::get_conversation(pool, "conv-1").await.unwrap();
        assert!(conv.is_urgent);
        assert_eq!(conv.status, ConversationStatus::PendingHandoff);
    }

    #[tokio::test]
    async fn test_awaiting_reply_marker_guard() {
        let db = test_db().await;
        let pool = db.pool();

        lead::create_lead(pool, &sample_lead("lead-1", "+5511999887766"))
            .await
            .unwrap();
        conversation::create_conversation(pool, "conv-1", "lead-1")
            .await
            .unwrap();

        assert!(conversation::mark_awaiting_reply_if_clear(pool, "conv-1")
            .await
            .unwrap());
        // Second take loses the guard
        assert!(!conversation::mark_awaiting_reply_if_clear(pool, "conv-1")
            .await
            .unwrap());

        conversation::clear_awaiting_reply(pool, "conv-1").await.unwrap();
        assert!(conversation::mark_awaiting_reply_if_clear(pool, "conv-1")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_stale_conversation_listing() {
        let db = test_db().await;
        let pool = db.pool();

        lead::create_lead(pool, &sample_lead("lead-1", "+5511999887766"))
            .await
            .unwrap();
        conversation::create_conversation(pool, "conv-1", "lead-1")
            .await
            .unwrap();
        conversation::update_status_if(
            pool,
            "conv-1",
            ConversationStatus::ActiveBot,
            ConversationStatus::PendingHandoff,
        )
        .await
        .unwrap();

        message::append_text_message(pool, "conv-1", MessageDirection::Inbound, "hello?")
            .await
            .unwrap();

        // Backdate the message so the conversation is stale against a
        // cutoff in the recent past.
        sqlx::query(
            "UPDATE conversation_messages SET created_at = '2026-01-01 00:00:00' \
             WHERE conversation_id = 'conv-1'",
        )
        .execute(pool)
        .await
        .unwrap();

        let stale = conversation::list_stale_by_status(
            pool,
            ConversationStatus::PendingHandoff,
            "2026-01-03 00:00:00",
        )
        .await
        .unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, "conv-1");

        // A fresh message takes it out of the stale set
        message::append_text_message(pool, "conv-1", MessageDirection::Inbound, "are you there")
            .await
            .unwrap();
        let stale = conversation::list_stale_by_status(
            pool,
            ConversationStatus::PendingHandoff,
            "2026-01-03 00:00:00",
        )
        .await
        .unwrap();
        assert!(stale.is_empty());
    }

    #[tokio::test]
    async fn test_messages_append_and_latest() {
        let db = test_db().await;
        let pool = db.pool();

        lead::create_lead(pool, &sample_lead("lead-1", "+5511999887766"))
            .await
            .unwrap();
        conversation::create_conversation(pool, "conv-1", "lead-1")
            .await
            .unwrap();

        assert!(message::latest_timestamp(pool, "conv-1").await.unwrap().is_none());

        message::append_text_message(pool, "conv-1", MessageDirection::Inbound, "hi")
            .await
            .unwrap();
        let payload = MessagePayload {
            media_url: Some("https://cdn.example.com/a.ogg".to_string()),
            media_mime_type: Some("audio/ogg".to_string()),
            transcription: Some("I want to book a visit".to_string()),
            ..Default::default()
        };
        message::append_message(pool, "conv-1", MessageDirection::Inbound, "", &payload)
            .await
            .unwrap();

        let messages = message::list_for_conversation(pool, "conv-1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hi");
        assert_eq!(
            messages[1].transcription.as_deref(),
            Some("I want to book a visit")
        );
        assert!(message::latest_timestamp(pool, "conv-1").await.unwrap().is_some());
        assert_eq!(message::count_for_conversation(pool, "conv-1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_tags_attach_detach() {
        let db = test_db().await;
        let pool = db.pool();

        lead::create_lead(pool, &sample_lead("lead-1", "+5511999887766"))
            .await
            .unwrap();
        conversation::create_conversation(pool, "conv-1", "lead-1")
            .await
            .unwrap();

        let hot = tag::create_tag(pool, "hot-lead", "#e53935").await.unwrap();
        tag::create_tag(pool, "pricing", "#1e88e5").await.unwrap();

        let result = tag::create_tag(pool, "hot-lead", "#000000").await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));

        tag::attach_tag(pool, "conv-1", hot.id).await.unwrap();
        let result = tag::attach_tag(pool, "conv-1", hot.id).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));

        let tags = tag::tags_for_conversation(pool, "conv-1").await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "hot-lead");

        let associations = tag::associations_for_conversation(pool, "conv-1").await.unwrap();
        assert_eq!(associations.len(), 1);
        assert!(!associations[0].created_at.is_empty());

        tag::detach_tag(pool, "conv-1", hot.id).await.unwrap();
        let result = tag::detach_tag(pool, "conv-1", hot.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_notifications_mark_read() {
        let db = test_db().await;
        let pool = db.pool();

        let id = notification::create_notification(
            pool,
            "op-1",
            "handoff_requested",
            "Handoff requested",
            "Conversation conv-1 is waiting for an operator",
        )
        .await
        .unwrap();

        assert_eq!(notification::count_unread(pool, "op-1").await.unwrap(), 1);

        notification::mark_read(pool, id).await.unwrap();
        assert_eq!(notification::count_unread(pool, "op-1").await.unwrap(), 0);

        let all = notification::list_for_user(pool, "op-1", false).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].read);
        let unread = notification::list_for_user(pool, "op-1", true).await.unwrap();
        assert!(unread.is_empty());
    }

    #[tokio::test]
    async fn test_operators() {
        let db = test_db().await;
        let pool = db.pool();

        let op = Operator {
            id: "op-1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            active: true,
            created_at: String::new(),
        };
        operator::create_operator(pool, &op).await.unwrap();

        let mut inactive = op.clone();
        inactive.id = "op-2".to_string();
        inactive.email = "bruno@example.com".to_string();
        inactive.name = "Bruno".to_string();
        operator::create_operator(pool, &inactive).await.unwrap();
        operator::set_active(pool, "op-2", false).await.unwrap();

        let active = operator::list_active_operators(pool).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "op-1");
        assert_eq!(operator::list_operators(pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_playbook_step_ordering() {
        let db = test_db().await;
        let pool = db.pool();

        let topic = playbook::create_topic(pool, "scheduling", "Appointment scheduling")
            .await
            .unwrap();
        playbook::create_playbook(pool, "pb-1", topic.id, "Book a visit", None)
            .await
            .unwrap();

        let first = playbook::append_step(pool, "pb-1", "When works best for you?", None)
            .await
            .unwrap();
        let second = playbook::append_step(
            pool,
            "pb-1",
            "Great, I'll pencil that in.",
            Some("after the lead offers a time"),
        )
        .await
        .unwrap();

        assert_eq!(first.step_order, 1);
        assert_eq!(second.step_order, 2);

        let steps = playbook::steps_for_playbook(pool, "pb-1").await.unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].step_order, 1);
        assert_eq!(steps[1].step_order, 2);

        // Embedding record upsert
        playbook::upsert_embedding(pool, "pb-1", "doc-9", "abc123").await.unwrap();
        playbook::upsert_embedding(pool, "pb-1", "doc-9", "def456").await.unwrap();
        let embedding = playbook::get_embedding(pool, "pb-1").await.unwrap().unwrap();
        assert_eq!(embedding.digest, "def456");

        // Steps for an unknown playbook
        let result = playbook::append_step(pool, "pb-missing", "x", None).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_audit_log() {
        let db = test_db().await;
        let pool = db.pool();

        audit::record(pool, "op-1", "conversation", "conv-1", "ACTIVE_BOT", "PENDING_HANDOFF")
            .await
            .unwrap();
        audit::record(pool, "op-1", "conversation", "conv-1", "PENDING_HANDOFF", "ACTIVE_HUMAN")
            .await
            .unwrap();

        let entries = audit::list_for_entity(pool, "conversation", "conv-1").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].old_value, "ACTIVE_BOT");
        assert_eq!(entries[1].new_value, "ACTIVE_HUMAN");
        assert_eq!(
            audit::count_for_entity(pool, "conversation", "conv-1").await.unwrap(),
            2
        );
        assert_eq!(
            audit::count_for_entity(pool, "conversation", "other").await.unwrap(),
            0
        );
    }
}
