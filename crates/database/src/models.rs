//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle status of a conversation.
///
/// Stored as canonical SCREAMING_SNAKE_CASE text. Legacy aliases from the
/// previous system (`ACTIVE`, `PENDING`) are accepted by [`ConversationStatus::parse`]
/// at input boundaries but never written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationStatus {
    /// The automated agent owns the conversation.
    ActiveBot,
    /// The bot asked for a human; nobody has claimed it yet.
    PendingHandoff,
    /// A human operator owns the conversation.
    ActiveHuman,
    /// Outcome achieved. Terminal.
    Completed,
    /// The bot could not proceed; needs urgent human attention.
    Escalated,
    /// Closed by an operator or a timeout job. Terminal.
    Closed,
}

impl ConversationStatus {
    /// Canonical textual form, as stored and audited.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::ActiveBot => "ACTIVE_BOT",
            ConversationStatus::PendingHandoff => "PENDING_HANDOFF",
            ConversationStatus::ActiveHuman => "ACTIVE_HUMAN",
            ConversationStatus::Completed => "COMPLETED",
            ConversationStatus::Escalated => "ESCALATED",
            ConversationStatus::Closed => "CLOSED",
        }
    }

    /// Parse a status from client input, translating legacy aliases.
    ///
    /// `ACTIVE` maps to `ActiveBot` and `PENDING` to `PendingHandoff`;
    /// matching is case-insensitive. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACTIVE_BOT" | "ACTIVE" => Some(ConversationStatus::ActiveBot),
            "PENDING_HANDOFF" | "PENDING" => Some(ConversationStatus::PendingHandoff),
            "ACTIVE_HUMAN" => Some(ConversationStatus::ActiveHuman),
            "COMPLETED" => Some(ConversationStatus::Completed),
            "ESCALATED" => Some(ConversationStatus::Escalated),
            "CLOSED" => Some(ConversationStatus::Closed),
            _ => None,
        }
    }

    /// Whether this status is terminal (no transitions out).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConversationStatus::Completed | ConversationStatus::Closed
        )
    }

    /// Whether the transition graph allows moving from `self` to `to`.
    pub fn allows(&self, to: ConversationStatus) -> bool {
        use ConversationStatus::*;

        if to == Closed {
            return !self.is_terminal();
        }

        matches!(
            (self, to),
            (ActiveBot, PendingHandoff)
                | (ActiveBot, Escalated)
                | (PendingHandoff, ActiveHuman)
                | (ActiveHuman, Completed)
                | (ActiveHuman, ActiveBot)
                | (Escalated, ActiveHuman)
        )
    }
}

/// Direction of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageDirection {
    /// From the lead to the system.
    Inbound,
    /// From the bot or an operator to the lead.
    Outbound,
}

/// A prospective customer tracked through the sales pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Lead {
    /// UUID.
    pub id: String,
    /// WhatsApp phone number (unique).
    pub phone: String,
    /// Display name.
    pub name: String,
    /// Email address, if known.
    pub email: Option<String>,
    /// Sales maturity score, 0-100.
    pub maturity_score: i64,
    /// Operator responsible for this lead, if any.
    pub assigned_operator_id: Option<String>,
    /// Soft-delete timestamp. Leads are never hard-deleted.
    pub deleted_at: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl Lead {
    /// Whether this lead has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A conversation between a lead and the bot/operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    /// UUID.
    pub id: String,
    /// Owning lead.
    pub lead_id: String,
    /// Current lifecycle status.
    pub status: ConversationStatus,
    /// Urgency flag, independent of status.
    pub is_urgent: bool,
    /// Free-text operator notes.
    pub notes: Option<String>,
    /// Set when the re-engagement sweep has pinged this conversation and
    /// no reply has arrived yet.
    pub awaiting_reply: bool,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// A single message within a conversation. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ConversationMessage {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning conversation.
    pub conversation_id: String,
    /// Inbound or outbound.
    pub direction: MessageDirection,
    /// Text content (caption for media, empty for bare location pins).
    pub content: String,
    /// Audio transcription, if the gateway supplied one.
    pub transcription: Option<String>,
    /// Media URL for audio/image/document messages.
    pub media_url: Option<String>,
    /// MIME type of the media, if any.
    pub media_mime_type: Option<String>,
    /// Location latitude.
    pub latitude: Option<f64>,
    /// Location longitude.
    pub longitude: Option<f64>,
    /// Creation timestamp.
    pub created_at: String,
}

/// A label attachable to conversations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Unique tag name.
    pub name: String,
    /// Display color (hex).
    pub color: String,
}

/// Association between a conversation and a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ConversationTag {
    /// Tagged conversation.
    pub conversation_id: String,
    /// Applied tag.
    pub tag_id: i64,
    /// When the tag was applied.
    pub created_at: String,
}

/// An operator-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Target user (operator) ID.
    pub user_id: String,
    /// Notification kind (e.g. "handoff_requested").
    pub kind: String,
    /// Short title.
    pub title: String,
    /// Message body.
    pub body: String,
    /// Whether the user has read it. The only mutable field.
    pub read: bool,
    /// Creation timestamp.
    pub created_at: String,
}

/// A human operator account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Operator {
    /// UUID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Unique email address.
    pub email: String,
    /// Inactive operators are excluded from notification fan-out.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: String,
}

/// A category grouping playbooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Topic {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Unique URL-safe identifier.
    pub slug: String,
    /// Human-readable title.
    pub title: String,
}

/// A named, ordered sequence of template messages addressing a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Playbook {
    /// UUID.
    pub id: String,
    /// Owning topic.
    pub topic_id: i64,
    /// Playbook title.
    pub title: String,
    /// What situations this playbook addresses.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// One step of a playbook. `step_order` is unique and sequential (1..=n)
/// within its playbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PlaybookStep {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning playbook.
    pub playbook_id: String,
    /// Position within the playbook, starting at 1.
    pub step_order: i64,
    /// The message content to send.
    pub content: String,
    /// Guidance for the agent on when/how to use this step.
    pub context_hint: Option<String>,
}

/// Local record of a playbook's document in the external semantic index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PlaybookEmbedding {
    /// Indexed playbook.
    pub playbook_id: String,
    /// Document ID assigned by the index service.
    pub document_id: String,
    /// Digest of the indexed text, for staleness detection.
    pub digest: String,
    /// When the playbook was last pushed to the index.
    pub indexed_at: String,
}

/// An audit-log entry recording a value change on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Who made the change (operator ID, "bot", or "system").
    pub actor: String,
    /// Entity type, e.g. "conversation".
    pub entity_type: String,
    /// Entity ID.
    pub entity_id: String,
    /// Value before the change.
    pub old_value: String,
    /// Value after the change.
    pub new_value: String,
    /// Creation timestamp.
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_canonical_and_aliases() {
        assert_eq!(
            ConversationStatus::parse("ACTIVE_BOT"),
            Some(ConversationStatus::ActiveBot)
        );
        assert_eq!(
            ConversationStatus::parse("ACTIVE"),
            Some(ConversationStatus::ActiveBot)
        );
        assert_eq!(
            ConversationStatus::parse("pending"),
            Some(ConversationStatus::PendingHandoff)
        );
        assert_eq!(
            ConversationStatus::parse("  closed "),
            Some(ConversationStatus::Closed)
        );
        assert_eq!(ConversationStatus::parse("ARCHIVED"), None);
    }

    #[test]
    fn test_transition_graph() {
        use ConversationStatus::*;

        assert!(ActiveBot.allows(PendingHandoff));
        assert!(ActiveBot.allows(Escalated));
        assert!(PendingHandoff.allows(ActiveHuman));
        assert!(ActiveHuman.allows(Completed));
        assert!(ActiveHuman.allows(ActiveBot));
        assert!(Escalated.allows(ActiveHuman));

        // Any non-terminal state can close.
        assert!(ActiveBot.allows(Closed));
        assert!(PendingHandoff.allows(Closed));
        assert!(ActiveHuman.allows(Closed));
        assert!(Escalated.allows(Closed));

        // Terminal states never regress.
        assert!(!Completed.allows(ActiveBot));
        assert!(!Completed.allows(Closed));
        assert!(!Closed.allows(ActiveBot));
        assert!(!Closed.allows(Closed));

        // Edges not in the table.
        assert!(!ActiveBot.allows(ActiveHuman));
        assert!(!ActiveBot.allows(Completed));
        assert!(!PendingHandoff.allows(Completed));
        assert!(!PendingHandoff.allows(ActiveBot));
        assert!(!Escalated.allows(ActiveBot));
        assert!(!Escalated.allows(Completed));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ConversationStatus::ActiveBot,
            ConversationStatus::PendingHandoff,
            ConversationStatus::ActiveHuman,
            ConversationStatus::Completed,
            ConversationStatus::Escalated,
            ConversationStatus::Closed,
        ] {
            assert_eq!(ConversationStatus::parse(status.as_str()), Some(status));
        }
    }
}
