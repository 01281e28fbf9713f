//! Re-engagement sweep for conversations stuck waiting on a handoff.
//!
//! Finds `PENDING_HANDOFF` conversations whose last message is older
//! than the inactivity threshold, sends each lead one nudge, and sets
//! the `awaiting_reply` marker so the next sweep skips them. The
//! inactivity check is re-evaluated immediately before sending, so a
//! reply that arrives mid-sweep suppresses the nudge. One conversation
//! failing never aborts the rest of the batch.

use std::env;
use std::time::Duration;

use chrono::Utc;
use database::{conversation, lead, message, Conversation, ConversationStatus, Database,
    MessageDirection};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::LifecycleError;
use crate::sender::MessageSender;

/// Default inactivity threshold before a lead is nudged.
const DEFAULT_THRESHOLD: Duration = Duration::from_secs(48 * 60 * 60);

/// Default nudge text.
const DEFAULT_MESSAGE: &str =
    "Hi! Just checking in - we're still here if you'd like to continue. \
     Reply any time and we'll pick up where we left off.";

/// Re-engagement sweep settings.
#[derive(Debug, Clone)]
pub struct ReEngagementConfig {
    /// How long a conversation must be inactive before it qualifies.
    pub inactivity_threshold: Duration,
    /// The nudge sent to qualifying leads.
    pub message: String,
}

impl Default for ReEngagementConfig {
    fn default() -> Self {
        Self {
            inactivity_threshold: DEFAULT_THRESHOLD,
            message: DEFAULT_MESSAGE.to_string(),
        }
    }
}

impl ReEngagementConfig {
    /// Load sweep settings from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PARLA_REENGAGE_HOURS` | Inactivity threshold in hours | `48` |
    /// | `PARLA_REENGAGE_MESSAGE` | Nudge text | built-in |
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(hours) = env::var("PARLA_REENGAGE_HOURS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            if hours > 0 {
                config.inactivity_threshold = Duration::from_secs(hours * 60 * 60);
            }
        }
        if let Ok(message) = env::var("PARLA_REENGAGE_MESSAGE") {
            if !message.trim().is_empty() {
                config.message = message;
            }
        }

        config
    }
}

/// Outcome of one sweep run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Conversations matched by the initial scan.
    pub scanned: usize,
    /// Nudges actually sent.
    pub sent: usize,
    /// Conversations that no longer qualified at send time.
    pub skipped: usize,
    /// Conversations whose send failed; retried on the next sweep.
    pub failed: usize,
}

/// The re-engagement sweep.
///
/// Triggered externally (admin endpoint or scheduler); it does not
/// schedule itself.
pub struct ReEngagement<S: MessageSender> {
    db: Database,
    sender: S,
    config: ReEngagementConfig,
}

impl<S: MessageSender> ReEngagement<S> {
    /// Create a sweep over the given database and transport.
    pub fn new(db: Database, sender: S, config: ReEngagementConfig) -> Self {
        Self { db, sender, config }
    }

    /// Run one sweep and report what happened.
    pub async fn run(&self) -> Result<SweepReport, LifecycleError> {
        let cutoff = cutoff_timestamp(self.config.inactivity_threshold);

        let stale = conversation::list_stale_by_status(
            self.db.pool(),
            ConversationStatus::PendingHandoff,
            &cutoff,
        )
        .await?;

        let mut report = SweepReport {
            scanned: stale.len(),
            ..Default::default()
        };

        for conv in &stale {
            match self.process_one(conv, &cutoff).await {
                Ok(true) => report.sent += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!(
                        conversation_id = %conv.id,
                        "Re-engagement failed, will retry next sweep: {}",
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            scanned = report.scanned,
            sent = report.sent,
            skipped = report.skipped,
            failed = report.failed,
            "Re-engagement sweep complete"
        );

        Ok(report)
    }

    /// Nudge a single conversation. Returns `Ok(false)` when it no
    /// longer qualifies.
    async fn process_one(
        &self,
        conv: &Conversation,
        cutoff: &str,
    ) -> Result<bool, LifecycleError> {
        let pool = self.db.pool();

        // Re-evaluate the inactivity predicate right before sending; the
        // scan result may be stale by now.
        let last_activity = message::latest_timestamp(pool, &conv.id)
            .await?
            .unwrap_or_else(|| conv.created_at.clone());
        if last_activity.as_str() >= cutoff {
            debug!(conversation_id = %conv.id, "Reply arrived since scan, skipping");
            return Ok(false);
        }

        let current = conversation::get_conversation(pool, &conv.id).await?;
        if current.status != ConversationStatus::PendingHandoff {
            debug!(conversation_id = %conv.id, "Status changed since scan, skipping");
            return Ok(false);
        }

        // Take the marker first so a concurrent sweep cannot double-send.
        if !conversation::mark_awaiting_reply_if_clear(pool, &conv.id).await? {
            debug!(conversation_id = %conv.id, "Marker already taken, skipping");
            return Ok(false);
        }

        let lead = lead::get_lead(pool, &conv.lead_id).await?;

        if let Err(e) = self
            .sender
            .send(&conv.id, &lead.phone, &self.config.message)
            .await
        {
            // Undo the marker so the next sweep retries this one.
            conversation::clear_awaiting_reply(pool, &conv.id).await?;
            return Err(e);
        }

        message::append_text_message(
            pool,
            &conv.id,
            MessageDirection::Outbound,
            &self.config.message,
        )
        .await?;

        info!(conversation_id = %conv.id, lead_id = %conv.lead_id, "Re-engagement sent");
        Ok(true)
    }
}

/// UTC cutoff in the `YYYY-MM-DD HH:MM:SS` form SQLite's
/// `CURRENT_TIMESTAMP` writes, so text comparison is chronological.
fn cutoff_timestamp(threshold: Duration) -> String {
    let threshold = chrono::Duration::from_std(threshold)
        .unwrap_or_else(|_| chrono::Duration::hours(48));
    (Utc::now() - threshold).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LifecycleError;
    use async_trait::async_trait;
    use database::models::Lead;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Records every send; optionally fails for specific recipients.
    #[derive(Clone, Default)]
    struct RecordingSender {
        sent: Arc<Mutex<Vec<(String, String, String)>>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send(
            &self,
            conversation_id: &str,
            recipient: &str,
            text: &str,
        ) -> Result<(), LifecycleError> {
            if self.fail_for.as_deref() == Some(recipient) {
                return Err(LifecycleError::Send {
                    conversation_id: conversation_id.to_string(),
                    reason: "gateway unreachable".to_string(),
                });
            }
            self.sent.lock().await.push((
                conversation_id.to_string(),
                recipient.to_string(),
                text.to_string(),
            ));
            Ok(())
        }
    }

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    /// Seed a PENDING_HANDOFF conversation whose last message is backdated.
    async fn seed_stale(db: &Database, conv_id: &str, phone: &str, last_message_at: &str) {
        let pool = db.pool();
        let lead = Lead {
            id: format!("lead-{}", conv_id),
            phone: phone.to_string(),
            name: "Maria".to_string(),
            email: None,
            maturity_score: 0,
            assigned_operator_id: None,
            deleted_at: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        lead::create_lead(pool, &lead).await.unwrap();
        conversation::create_conversation(pool, conv_id, &lead.id)
            .await
            .unwrap();
        conversation::update_status_if(
            pool,
            conv_id,
            ConversationStatus::ActiveBot,
            ConversationStatus::PendingHandoff,
        )
        .await
        .unwrap();

        message::append_text_message(pool, conv_id, MessageDirection::Inbound, "hello?")
            .await
            .unwrap();
        sqlx::query("UPDATE conversation_messages SET created_at = ? WHERE conversation_id = ?")
            .bind(last_message_at)
            .bind(conv_id)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_sends_once_and_marks() {
        let db = test_db().await;
        seed_stale(&db, "conv-1", "+5511999887701", "2026-01-01 00:00:00").await;

        let sender = RecordingSender::default();
        let sweep = ReEngagement::new(db.clone(), sender.clone(), ReEngagementConfig::default());

        let report = sweep.run().await.unwrap();
        assert_eq!(report.scanned, 1);
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 0);

        let sent = sender.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "+5511999887701");
        drop(sent);

        // Marker is set and the nudge was persisted as an outbound message
        let conv = conversation::get_conversation(db.pool(), "conv-1").await.unwrap();
        assert!(conv.awaiting_reply);
        let messages = message::list_for_conversation(db.pool(), "conv-1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].direction, MessageDirection::Outbound);

        // Immediate rerun scans nothing and resends nothing
        let report = sweep.run().await.unwrap();
        assert_eq!(report.scanned, 0);
        assert_eq!(report.sent, 0);
        assert_eq!(sender.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_reply_between_scan_and_send_suppresses_nudge() {
        let db = test_db().await;
        seed_stale(&db, "conv-1", "+5511999887701", "2026-01-01 00:00:00").await;

        let sender = RecordingSender::default();
        let sweep = ReEngagement::new(db.clone(), sender.clone(), ReEngagementConfig::default());

        // Snapshot the conversation the way the scan would have seen it,
        // then let a reply land before the per-conversation processing.
        let conv = conversation::get_conversation(db.pool(), "conv-1").await.unwrap();
        message::append_text_message(
            db.pool(),
            "conv-1",
            MessageDirection::Inbound,
            "sorry, got busy!",
        )
        .await
        .unwrap();

        let cutoff = cutoff_timestamp(ReEngagementConfig::default().inactivity_threshold);
        let sent = sweep.process_one(&conv, &cutoff).await.unwrap();
        assert!(!sent);
        assert!(sender.sent.lock().await.is_empty());

        let conv = conversation::get_conversation(db.pool(), "conv-1").await.unwrap();
        assert!(!conv.awaiting_reply);
    }

    #[tokio::test]
    async fn test_send_failure_clears_marker_for_retry() {
        let db = test_db().await;
        seed_stale(&db, "conv-1", "+5511999887701", "2026-01-01 00:00:00").await;

        let sender = RecordingSender {
            fail_for: Some("+5511999887701".to_string()),
            ..Default::default()
        };
        let sweep = ReEngagement::new(db.clone(), sender.clone(), ReEngagementConfig::default());

        let report = sweep.run().await.unwrap();
        assert_eq!(report.scanned, 1);
        assert_eq!(report.sent, 0);
        assert_eq!(report.failed, 1);

        // Marker cleared so the next sweep retries; nothing persisted
        let conv = conversation::get_conversation(db.pool(), "conv-1").await.unwrap();
        assert!(!conv.awaiting_reply);
        assert_eq!(
            message::count_for_conversation(db.pool(), "conv-1").await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_batch() {
        let db = test_db().await;
        seed_stale(&db, "conv-a", "+5511999887701", "2026-01-01 00:00:00").await;
        seed_stale(&db, "conv-b", "+5511999887702", "2026-01-01 00:00:00").await;

        let sender = RecordingSender {
            fail_for: Some("+5511999887701".to_string()),
            ..Default::default()
        };
        let sweep = ReEngagement::new(db.clone(), sender.clone(), ReEngagementConfig::default());

        let report = sweep.run().await.unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 1);

        let sent = sender.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "+5511999887702");
    }

    #[tokio::test]
    async fn test_status_change_since_scan_skips() {
        let db = test_db().await;
        seed_stale(&db, "conv-1", "+5511999887701", "2026-01-01 00:00:00").await;

        let sender = RecordingSender::default();
        let sweep = ReEngagement::new(db.clone(), sender.clone(), ReEngagementConfig::default());

        let conv = conversation::get_conversation(db.pool(), "conv-1").await.unwrap();

        // An operator claims it between scan and send
        conversation::update_status_if(
            db.pool(),
            "conv-1",
            ConversationStatus::PendingHandoff,
            ConversationStatus::ActiveHuman,
        )
        .await
        .unwrap();

        let cutoff = cutoff_timestamp(ReEngagementConfig::default().inactivity_threshold);
        let sent = sweep.process_one(&conv, &cutoff).await.unwrap();
        assert!(!sent);
        assert!(sender.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_config_from_env_defaults() {
        let config = ReEngagementConfig::default();
        assert_eq!(config.inactivity_threshold, Duration::from_secs(48 * 60 * 60));
        assert!(!config.message.is_empty());
    }
}
