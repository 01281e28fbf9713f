//! Semantic index trait and implementations.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::IndexError;

/// One ranked hit from the semantic index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    /// Playbook the indexed document belongs to.
    pub playbook_id: String,
    /// Similarity score, higher is better.
    pub score: f32,
}

/// Trait for vector-similarity search over indexed playbooks.
///
/// Abstracted to support different index services (and tests).
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Search for playbooks relevant to `query`.
    ///
    /// Returns up to `top_k` hits ranked by descending score. `topic`
    /// restricts the search to playbooks under one topic slug.
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        topic: Option<&str>,
    ) -> Result<Vec<IndexHit>, IndexError>;
}

/// Search request sent to the index service.
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<&'a str>,
}

/// Search response from the index service.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<IndexHit>,
}

/// HTTP client for an external vector-similarity index service.
#[derive(Debug, Clone)]
pub struct HttpSemanticIndex {
    http: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpSemanticIndex {
    /// Default request timeout.
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a client for the index service at `base_url`.
    pub fn new(base_url: &str, api_token: Option<String>) -> Result<Self, IndexError> {
        if base_url.trim().is_empty() {
            return Err(IndexError::MissingUrl);
        }

        let http = Client::builder()
            .timeout(Self::DEFAULT_TIMEOUT)
            .build()
            .map_err(IndexError::Http)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    /// Create a client from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PARLA_INDEX_URL` | Index service base URL | (required) |
    /// | `PARLA_INDEX_TOKEN` | Bearer token | (none) |
    pub fn from_env() -> Result<Self, IndexError> {
        let base_url = env::var("PARLA_INDEX_URL").map_err(|_| IndexError::MissingUrl)?;
        let api_token = env::var("PARLA_INDEX_TOKEN").ok();
        Self::new(&base_url, api_token)
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

#[async_trait]
impl SemanticIndex for HttpSemanticIndex {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        topic: Option<&str>,
    ) -> Result<Vec<IndexHit>, IndexError> {
        let request = SearchRequest { query, top_k, topic };

        debug!("Index search: top_k={} topic={:?}", top_k, topic);

        let mut builder = self.http.post(self.search_url()).json(&request);
        if let Some(ref token) = self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IndexError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.results)
    }
}

/// An in-memory index returning canned hits, for tests.
#[derive(Debug, Clone, Default)]
pub struct FixedIndex {
    hits: Vec<IndexHit>,
}

impl FixedIndex {
    /// Create an index that always returns the given hits.
    pub fn new(hits: Vec<IndexHit>) -> Self {
        Self { hits }
    }
}

#[async_trait]
impl SemanticIndex for FixedIndex {
    async fn search(
        &self,
        _query: &str,
        top_k: usize,
        _topic: Option<&str>,
    ) -> Result<Vec<IndexHit>, IndexError> {
        Ok(self.hits.iter().take(top_k).cloned().collect())
    }
}

/// An index that always fails, for exercising the fail-open path.
#[derive(Debug, Clone, Default)]
pub struct FailingIndex;

#[async_trait]
impl SemanticIndex for FailingIndex {
    async fn search(
        &self,
        _query: &str,
        _top_k: usize,
        _topic: Option<&str>,
    ) -> Result<Vec<IndexHit>, IndexError> {
        Err(IndexError::Api {
            status: 503,
            message: "index unavailable".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_url() {
        assert!(matches!(
            HttpSemanticIndex::new("", None),
            Err(IndexError::MissingUrl)
        ));
    }

    #[test]
    fn test_search_url_strips_trailing_slash() {
        let index = HttpSemanticIndex::new("http://localhost:9200/", None).unwrap();
        assert_eq!(index.search_url(), "http://localhost:9200/search");
    }

    #[tokio::test]
    async fn test_fixed_index_respects_top_k() {
        let index = FixedIndex::new(vec![
            IndexHit { playbook_id: "a".to_string(), score: 0.9 },
            IndexHit { playbook_id: "b".to_string(), score: 0.8 },
            IndexHit { playbook_id: "c".to_string(), score: 0.7 },
        ]);

        let hits = index.search("anything", 2, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].playbook_id, "a");
    }
}
