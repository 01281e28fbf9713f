//! The conversation lifecycle manager.
//!
//! Owns the status state machine and executes transitions: validate the
//! edge, persist the new status behind an optimistic guard, append one
//! audit entry, and notify operators when a conversation enters
//! `PENDING_HANDOFF` or `ESCALATED`. Audit and notification happen only
//! after the status write is durable; a failed transition leaves nothing
//! behind.

use database::{audit, conversation, lead, operator, Conversation, ConversationStatus, Database};
use tracing::{info, warn};

use crate::error::LifecycleError;
use crate::notifier::{NotificationKind, Notifier};

/// Entity type used for conversation audit entries.
const AUDIT_ENTITY: &str = "conversation";

/// Coordinates conversation status transitions.
///
/// Holds no state of its own; every decision is made from data fetched
/// fresh per call and written back through the guarded update in the
/// database crate. Claims are exclusive because the guard only matches
/// the expected prior status — losing that race is surfaced as
/// [`LifecycleError::AlreadyClaimed`], never a silent overwrite.
pub struct LifecycleManager<N: Notifier> {
    db: Database,
    notifier: N,
}

impl<N: Notifier> LifecycleManager<N> {
    /// Create a new lifecycle manager.
    pub fn new(db: Database, notifier: N) -> Self {
        Self { db, notifier }
    }

    /// Get the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Execute a status transition for a conversation.
    ///
    /// Validates the edge against the transition graph, then performs the
    /// guarded status update. On success exactly one audit entry is
    /// recorded, and transitions into `PENDING_HANDOFF`/`ESCALATED` fan
    /// out a notification to every active operator. Returns the updated
    /// conversation.
    pub async fn transition(
        &self,
        conversation_id: &str,
        to: ConversationStatus,
        actor: &str,
    ) -> Result<Conversation, LifecycleError> {
        let pool = self.db.pool();

        let current = conversation::get_conversation(pool, conversation_id).await?;
        let from = current.status;

        if !from.allows(to) {
            return Err(LifecycleError::InvalidTransition {
                conversation_id: conversation_id.to_string(),
                from,
                to,
            });
        }

        let updated = conversation::update_status_if(pool, conversation_id, from, to).await?;
        if !updated {
            // Lost the optimistic race: someone else moved the status
            // between our read and our write. Re-read and report against
            // the fresh value.
            let fresh = conversation::get_conversation(pool, conversation_id).await?;
            if to == ConversationStatus::ActiveHuman
                && fresh.status == ConversationStatus::ActiveHuman
            {
                return Err(LifecycleError::AlreadyClaimed {
                    conversation_id: conversation_id.to_string(),
                });
            }
            return Err(LifecycleError::InvalidTransition {
                conversation_id: conversation_id.to_string(),
                from: fresh.status,
                to,
            });
        }

        info!(
            conversation_id,
            actor,
            from = from.as_str(),
            to = to.as_str(),
            "Conversation transition"
        );

        // The status write is durable; record the audit trail. An audit
        // failure surfaces as a persistence error so the caller knows
        // the trail is incomplete.
        audit::record(
            pool,
            actor,
            AUDIT_ENTITY,
            conversation_id,
            from.as_str(),
            to.as_str(),
        )
        .await?;

        match to {
            ConversationStatus::PendingHandoff => {
                self.notify_operators(
                    conversation_id,
                    NotificationKind::HandoffRequested,
                    &format!("Conversation {} is waiting for an operator", conversation_id),
                )
                .await;
            }
            ConversationStatus::Escalated => {
                self.notify_operators(
                    conversation_id,
                    NotificationKind::ConversationEscalated,
                    &format!("Conversation {} needs urgent attention", conversation_id),
                )
                .await;
            }
            _ => {}
        }

        conversation::get_conversation(pool, conversation_id)
            .await
            .map_err(LifecycleError::from)
    }

    /// The bot requests a human takeover.
    pub async fn request_handoff(
        &self,
        conversation_id: &str,
        actor: &str,
    ) -> Result<Conversation, LifecycleError> {
        self.transition(conversation_id, ConversationStatus::PendingHandoff, actor)
            .await
    }

    /// The bot escalates a conversation it cannot proceed with.
    pub async fn escalate(
        &self,
        conversation_id: &str,
        actor: &str,
    ) -> Result<Conversation, LifecycleError> {
        self.transition(conversation_id, ConversationStatus::Escalated, actor)
            .await
    }

    /// An operator claims a pending or escalated conversation.
    ///
    /// At most one operator succeeds per conversation; the loser gets
    /// [`LifecycleError::AlreadyClaimed`]. A successful claim also
    /// assigns the operator to the conversation's lead.
    pub async fn claim(
        &self,
        conversation_id: &str,
        operator_id: &str,
    ) -> Result<Conversation, LifecycleError> {
        let pool = self.db.pool();

        let current = conversation::get_conversation(pool, conversation_id).await?;
        if current.status == ConversationStatus::ActiveHuman {
            return Err(LifecycleError::AlreadyClaimed {
                conversation_id: conversation_id.to_string(),
            });
        }

        let claimed = self
            .transition(conversation_id, ConversationStatus::ActiveHuman, operator_id)
            .await?;

        lead::assign_operator(pool, &claimed.lead_id, Some(operator_id)).await?;

        Ok(claimed)
    }

    /// An operator marks the outcome achieved.
    pub async fn complete(
        &self,
        conversation_id: &str,
        actor: &str,
    ) -> Result<Conversation, LifecycleError> {
        self.transition(conversation_id, ConversationStatus::Completed, actor)
            .await
    }

    /// An operator releases the conversation back to the bot.
    pub async fn release_to_bot(
        &self,
        conversation_id: &str,
        actor: &str,
    ) -> Result<Conversation, LifecycleError> {
        self.transition(conversation_id, ConversationStatus::ActiveBot, actor)
            .await
    }

    /// An operator or timeout job closes the conversation.
    pub async fn close(
        &self,
        conversation_id: &str,
        actor: &str,
    ) -> Result<Conversation, LifecycleError> {
        self.transition(conversation_id, ConversationStatus::Closed, actor)
            .await
    }

    /// Fan a notification out to all active operators.
    ///
    /// Emit failures are logged and swallowed: the transition is already
    /// durable and audited, and operators can still find the
    /// conversation through the queue listing.
    async fn notify_operators(&self, conversation_id: &str, kind: NotificationKind, body: &str) {
        let operators = match operator::list_active_operators(self.db.pool()).await {
            Ok(operators) => operators,
            Err(e) => {
                warn!(conversation_id, "Failed to list operators for notification: {}", e);
                return;
            }
        };

        for op in operators {
            if let Err(e) = self.notifier.notify(&op.id, kind, kind.title(), body).await {
                warn!(
                    conversation_id,
                    operator_id = %op.id,
                    "Failed to deliver notification: {}",
                    e
                );
            }
        }
    }
}
