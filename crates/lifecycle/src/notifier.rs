//! Notifier trait and implementations.

use async_trait::async_trait;
use database::{notification, Database};

use crate::error::LifecycleError;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// The bot requested a human takeover.
    HandoffRequested,
    /// The bot escalated a conversation it cannot handle.
    ConversationEscalated,
    /// The sweep pinged an inactive lead.
    ReEngagementSent,
}

impl NotificationKind {
    /// Stable identifier stored with the notification.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::HandoffRequested => "handoff_requested",
            NotificationKind::ConversationEscalated => "conversation_escalated",
            NotificationKind::ReEngagementSent => "reengagement_sent",
        }
    }

    /// Default human-readable title.
    pub fn title(&self) -> &'static str {
        match self {
            NotificationKind::HandoffRequested => "Handoff requested",
            NotificationKind::ConversationEscalated => "Conversation escalated",
            NotificationKind::ReEngagementSent => "Re-engagement sent",
        }
    }
}

/// Trait for delivering notifications to operators.
///
/// Abstracted so the lifecycle manager can be tested without a database
/// and so deployments can swap in push/email channels later.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification to one user.
    async fn notify(
        &self,
        user_id: &str,
        kind: NotificationKind,
        title: &str,
        body: &str,
    ) -> Result<(), LifecycleError>;
}

/// A no-op notifier for testing that discards all notifications.
#[derive(Debug, Clone, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify(
        &self,
        _user_id: &str,
        _kind: NotificationKind,
        _title: &str,
        _body: &str,
    ) -> Result<(), LifecycleError> {
        Ok(())
    }
}

/// A logging notifier for debugging that logs all notifications.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(
        &self,
        user_id: &str,
        kind: NotificationKind,
        title: &str,
        body: &str,
    ) -> Result<(), LifecycleError> {
        tracing::info!(
            "[{}] Notifying {}: {} - {}",
            kind.as_str(),
            user_id,
            title,
            body
        );
        Ok(())
    }
}

/// Notifier that persists notification rows for the operator inbox.
#[derive(Debug, Clone)]
pub struct DatabaseNotifier {
    db: Database,
}

impl DatabaseNotifier {
    /// Create a database-backed notifier.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Notifier for DatabaseNotifier {
    async fn notify(
        &self,
        user_id: &str,
        kind: NotificationKind,
        title: &str,
        body: &str,
    ) -> Result<(), LifecycleError> {
        notification::create_notification(self.db.pool(), user_id, kind.as_str(), title, body)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_notifier() {
        let notifier = NoOpNotifier;
        notifier
            .notify("op-1", NotificationKind::HandoffRequested, "t", "b")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_database_notifier_persists() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();

        let notifier = DatabaseNotifier::new(db.clone());
        notifier
            .notify(
                "op-1",
                NotificationKind::ConversationEscalated,
                "Conversation escalated",
                "conv-1 needs attention",
            )
            .await
            .unwrap();

        let rows = notification::list_for_user(db.pool(), "op-1", true).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "conversation_escalated");
    }
}
