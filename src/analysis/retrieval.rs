//! Content retrieval collaborator — search-index queries behind a trait.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::analysis::types::RetrievedContent;
use crate::auth::{REQUIRED_SCOPES, TokenSource};
use crate::error::AnalysisError;

/// Rows requested per retrieval query.
const RETRIEVAL_TOP: usize = 10;

/// Retrieval seam: full-text search with an OData-style filter expression.
#[async_trait]
pub trait RetrievalService: Send + Sync {
    async fn search(
        &self,
        query: &str,
        filter: &str,
    ) -> Result<Vec<RetrievedContent>, AnalysisError>;
}

/// Retrieval client for the content search index. Reads run on behalf of
/// the signed-in user, so token acquisition here can surface a consent
/// challenge.
pub struct SearchIndexClient {
    http: reqwest::Client,
    endpoint: String,
    index: String,
    tokens: Arc<dyn TokenSource>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<RetrievedContent>,
}

impl SearchIndexClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        index: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            index: index.into(),
            tokens,
        }
    }
}

#[async_trait]
impl RetrievalService for SearchIndexClient {
    async fn search(
        &self,
        query: &str,
        filter: &str,
    ) -> Result<Vec<RetrievedContent>, AnalysisError> {
        let token = self.tokens.access_token(&REQUIRED_SCOPES).await?;

        let url = format!(
            "{}/indexes/{}/docs/search",
            self.endpoint.trim_end_matches('/'),
            self.index
        );

        let body = serde_json::json!({
            "search": query,
            "filter": filter,
            "top": RETRIEVAL_TOP,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(token.secret().expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Retrieval(e.to_string()))?
            .error_for_status()
            .map_err(|e| AnalysisError::Retrieval(e.to_string()))?;

        let results: SearchResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Retrieval(format!("invalid search response: {e}")))?;

        tracing::debug!(query, filter, rows = results.value.len(), "Retrieval complete");
        Ok(results.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_defaults_to_empty() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.value.is_empty());
    }

    #[test]
    fn search_response_parses_rows() {
        let json = r#"{"value": [{"title": "rules.md", "content": "x", "source": "rules"}]}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.value.len(), 1);
        assert_eq!(response.value[0].title, "rules.md");
    }
}
