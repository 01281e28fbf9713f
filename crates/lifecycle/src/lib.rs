//! Conversation lifecycle management for Parla.
//!
//! This crate provides the [`LifecycleManager`] type which owns the
//! conversation status state machine, and the [`ReEngagement`] sweep
//! that nudges leads stuck waiting on a handoff.
//!
//! # State machine
//!
//! ```text
//!                 ┌──────────────┐
//!        ┌───────▶│  ACTIVE_BOT  │◀──────── release ───────┐
//!        │        └──────┬───────┘                         │
//!        │    handoff    │      escalate                   │
//!        │        ┌──────┴──────────┐                      │
//!        │        ▼                 ▼                      │
//!        │ ┌────────────────┐ ┌───────────┐                │
//!        │ │PENDING_HANDOFF │ │ ESCALATED │                │
//!        │ └──────┬─────────┘ └─────┬─────┘                │
//!        │        │    claim        │ claim                │
//!        │        └────────┬────────┘                      │
//!        │                 ▼                               │
//!        │          ┌──────────────┐───────────────────────┘
//!        │          │ ACTIVE_HUMAN │──── complete ──▶ COMPLETED
//!        │          └──────────────┘
//!        │
//!        └── (any non-terminal state) ── close ──▶ CLOSED
//! ```
//!
//! Transitions are validated against this graph and persisted behind a
//! conditional update guarded on the expected prior status, so two
//! operators racing to claim the same conversation cannot both win.
//! Every successful transition appends exactly one audit entry, and
//! transitions into `PENDING_HANDOFF`/`ESCALATED` notify active
//! operators.
//!
//! # Example
//!
//! ```rust,ignore
//! use database::Database;
//! use lifecycle::{DatabaseNotifier, LifecycleManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:parla.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let manager = LifecycleManager::new(db.clone(), DatabaseNotifier::new(db));
//!
//!     // The bot asks for a human; an operator claims it
//!     manager.request_handoff("conv-1", "bot").await?;
//!     manager.claim("conv-1", "op-7").await?;
//!
//!     Ok(())
//! }
//! ```

mod error;
mod manager;
mod notifier;
mod reengage;
mod sender;

// Public exports
pub use error::LifecycleError;
pub use manager::LifecycleManager;
pub use notifier::{DatabaseNotifier, LoggingNotifier, NoOpNotifier, NotificationKind, Notifier};
pub use reengage::{ReEngagement, ReEngagementConfig, SweepReport};
pub use sender::{LoggingSender, MessageSender, NoOpSender};

// Re-export commonly used types from the persistence layer
pub use database::{Conversation, ConversationStatus};
