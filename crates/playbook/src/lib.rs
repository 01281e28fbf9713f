//! Playbook selection for Parla.
//!
//! Given a conversation's recent turns, the [`PlaybookSelector`] asks an
//! external vector-similarity index for the closest playbooks, applies a
//! minimum-confidence cutoff, and resolves the winner's entry step from
//! the local store. The result is zero or one [`StepRecommendation`] for
//! the agent to optionally send next; "no suitable playbook" is a normal
//! outcome, and an unreachable index degrades to the same outcome
//! instead of failing the conversation flow.
//!
//! # Example
//!
//! ```rust,ignore
//! use database::Database;
//! use playbook::{HttpSemanticIndex, PlaybookSelector, SelectorConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:parla.db?mode=rwc").await?;
//! let index = HttpSemanticIndex::from_env()?;
//! let selector = PlaybookSelector::new(db, index, SelectorConfig::from_env());
//!
//! match selector.select("how much does the premium plan cost", None).await? {
//!     Some(step) => println!("Suggest: {}", step.content),
//!     None => println!("No suitable playbook"),
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod index;
mod selector;

// Public exports
pub use error::{IndexError, SelectorError};
pub use index::{FailingIndex, FixedIndex, HttpSemanticIndex, IndexHit, SemanticIndex};
pub use selector::{query_from_turns, PlaybookSelector, SelectorConfig, StepRecommendation};
