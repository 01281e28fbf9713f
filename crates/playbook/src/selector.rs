//! The playbook selector.

use std::cmp::Ordering;
use std::env;

use database::{playbook, Database};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::SelectorError;
use crate::index::SemanticIndex;

/// Selector tuning.
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// How many candidates to retrieve from the index.
    pub top_k: usize,
    /// Minimum similarity score; candidates below it are discarded
    /// rather than suggested with low confidence.
    pub min_score: f32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            min_score: 0.78,
        }
    }
}

impl SelectorConfig {
    /// Load selector tuning from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PARLA_SELECTOR_TOP_K` | Candidates retrieved per query | `4` |
    /// | `PARLA_SELECTOR_MIN_SCORE` | Similarity cutoff | `0.78` |
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(top_k) = env::var("PARLA_SELECTOR_TOP_K")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            if top_k > 0 {
                config.top_k = top_k;
            }
        }
        if let Some(min_score) = env::var("PARLA_SELECTOR_MIN_SCORE")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
        {
            config.min_score = min_score;
        }

        config
    }
}

/// A recommended playbook step for the agent to optionally send next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecommendation {
    /// The matched playbook.
    pub playbook_id: String,
    /// Position of the recommended step within the playbook.
    pub step_order: i64,
    /// The message content to send.
    pub content: String,
    /// Guidance for the agent on when/how to use this step.
    pub context_hint: Option<String>,
    /// Similarity score of the matched playbook.
    pub score: f32,
}

/// Selects the playbook step most relevant to a conversation.
///
/// Ranking is delegated to an external [`SemanticIndex`]; this type
/// applies the confidence cutoff and resolves the winning playbook's
/// entry step from the local store. Callers must treat `None` as a
/// normal outcome, not an error.
pub struct PlaybookSelector<I: SemanticIndex> {
    db: Database,
    index: I,
    config: SelectorConfig,
}

impl<I: SemanticIndex> PlaybookSelector<I> {
    /// Create a selector over the given store and index.
    pub fn new(db: Database, index: I, config: SelectorConfig) -> Self {
        Self { db, index, config }
    }

    /// Return the most relevant playbook step for `query`, or `None`
    /// when nothing clears the cutoff.
    ///
    /// If the index is unreachable this logs a warning and returns
    /// `None`: the agent proceeds without a suggestion rather than the
    /// conversation flow failing.
    pub async fn select(
        &self,
        query: &str,
        topic: Option<&str>,
    ) -> Result<Option<StepRecommendation>, SelectorError> {
        if query.trim().is_empty() {
            return Ok(None);
        }

        let mut hits = match self.index.search(query, self.config.top_k, topic).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Semantic index unavailable, proceeding without a suggestion: {}", e);
                return Ok(None);
            }
        };

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        for hit in hits {
            if hit.score < self.config.min_score {
                // Ranked descending: everything from here on is below
                // the cutoff.
                break;
            }

            let steps = playbook::steps_for_playbook(self.db.pool(), &hit.playbook_id).await?;
            match steps.into_iter().next() {
                Some(step) => {
                    debug!(
                        playbook_id = %hit.playbook_id,
                        score = hit.score,
                        "Playbook recommendation"
                    );
                    return Ok(Some(StepRecommendation {
                        playbook_id: hit.playbook_id,
                        step_order: step.step_order,
                        content: step.content,
                        context_hint: step.context_hint,
                        score: hit.score,
                    }));
                }
                None => {
                    // Indexed but has no steps (or was deleted after
                    // indexing); fall through to the next candidate.
                    debug!(playbook_id = %hit.playbook_id, "Hit has no steps, skipping");
                }
            }
        }

        Ok(None)
    }
}

/// Build a selector query from the last few inbound turns.
///
/// Collapses each message to a single line and joins the most recent
/// `max_turns` of them, oldest first.
pub fn query_from_turns(turns: &[String], max_turns: usize) -> String {
    let start = turns.len().saturating_sub(max_turns);
    turns[start..]
        .iter()
        .map(|turn| {
            turn.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|turn| !turn.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{FailingIndex, FixedIndex, IndexHit};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    /// Seed a topic with one playbook carrying the given steps.
    async fn seed_playbook(db: &Database, playbook_id: &str, steps: &[&str]) {
        let pool = db.pool();
        let slug = format!("topic-{}", playbook_id);
        let topic = playbook::create_topic(pool, &slug, "Topic").await.unwrap();
        playbook::create_playbook(pool, playbook_id, topic.id, "Playbook", None)
            .await
            .unwrap();
        for content in steps {
            playbook::append_step(pool, playbook_id, content, None).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_select_returns_top_playbook_first_step() {
        let db = test_db().await;
        seed_playbook(&db, "pb-pricing", &["Our plans start at $49/month.", "Want a demo?"]).await;
        seed_playbook(&db, "pb-scheduling", &["When works best for you?"]).await;

        let index = FixedIndex::new(vec![
            IndexHit { playbook_id: "pb-scheduling".to_string(), score: 0.81 },
            IndexHit { playbook_id: "pb-pricing".to_string(), score: 0.92 },
        ]);
        let selector = PlaybookSelector::new(db, index, SelectorConfig::default());

        let recommendation = selector
            .select("how much does it cost", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(recommendation.playbook_id, "pb-pricing");
        assert_eq!(recommendation.step_order, 1);
        assert_eq!(recommendation.content, "Our plans start at $49/month.");
    }

    #[tokio::test]
    async fn test_below_cutoff_returns_no_match() {
        let db = test_db().await;
        seed_playbook(&db, "pb-pricing", &["Our plans start at $49/month."]).await;

        let index = FixedIndex::new(vec![IndexHit {
            playbook_id: "pb-pricing".to_string(),
            score: 0.41,
        }]);
        let selector = PlaybookSelector::new(db, index, SelectorConfig::default());

        let recommendation = selector.select("unrelated question", None).await.unwrap();
        assert!(recommendation.is_none());
    }

    #[tokio::test]
    async fn test_index_unavailable_fails_open() {
        let db = test_db().await;
        let selector = PlaybookSelector::new(db, FailingIndex, SelectorConfig::default());

        let recommendation = selector.select("anything", None).await.unwrap();
        assert!(recommendation.is_none());
    }

    #[tokio::test]
    async fn test_empty_playbook_falls_through_to_next_hit() {
        let db = test_db().await;
        seed_playbook(&db, "pb-empty", &[]).await;
        seed_playbook(&db, "pb-backup", &["Happy to help with that."]).await;

        let index = FixedIndex::new(vec![
            IndexHit { playbook_id: "pb-empty".to_string(), score: 0.95 },
            IndexHit { playbook_id: "pb-backup".to_string(), score: 0.85 },
        ]);
        let selector = PlaybookSelector::new(db, index, SelectorConfig::default());

        let recommendation = selector.select("help", None).await.unwrap().unwrap();
        assert_eq!(recommendation.playbook_id, "pb-backup");
    }

    #[tokio::test]
    async fn test_deleted_playbook_hit_is_skipped() {
        let db = test_db().await;
        // The index still knows "pb-gone" but the store never had it.
        let index = FixedIndex::new(vec![IndexHit {
            playbook_id: "pb-gone".to_string(),
            score: 0.9,
        }]);
        let selector = PlaybookSelector::new(db, index, SelectorConfig::default());

        let recommendation = selector.select("anything", None).await.unwrap();
        assert!(recommendation.is_none());
    }

    #[tokio::test]
    async fn test_empty_query_short_circuits() {
        let db = test_db().await;
        let selector = PlaybookSelector::new(db, FailingIndex, SelectorConfig::default());

        // Would fail open anyway, but an empty query never hits the index.
        let recommendation = selector.select("   ", None).await.unwrap();
        assert!(recommendation.is_none());
    }

    #[test]
    fn test_query_from_turns() {
        let turns = vec![
            "hi".to_string(),
            "do you have\nweekend availability?".to_string(),
            "also how much is it".to_string(),
        ];
        let query = query_from_turns(&turns, 2);
        assert_eq!(query, "do you have weekend availability?\nalso how much is it");

        assert_eq!(query_from_turns(&[], 3), "");
    }
}
