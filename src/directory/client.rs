//! Directory search collaborator — Microsoft Graph `/users` behind a trait.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::auth::{REQUIRED_SCOPES, TokenSource};
use crate::error::DirectoryError;

/// Fields requested from every directory search.
pub const SELECT_FIELDS: [&str; 3] = ["mail", "userPrincipalName", "displayName"];

/// One entry from a directory search. `mail` is the preferred deliverable
/// address, `user_principal_name` the fallback.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Directory search seam.
#[async_trait]
pub trait DirectorySearch: Send + Sync {
    /// Run one search expression, returning up to `max_results` entries with
    /// the given fields populated. The read is eventually consistent; the
    /// search index may lag the directory slightly.
    async fn search(
        &self,
        query: &str,
        fields: &[&str],
        max_results: usize,
    ) -> Result<Vec<DirectoryEntry>, DirectoryError>;
}

/// Graph `/users` search client.
pub struct GraphDirectoryClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    #[serde(default)]
    value: Vec<DirectoryEntry>,
}

impl GraphDirectoryClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            tokens,
        }
    }
}

#[async_trait]
impl DirectorySearch for GraphDirectoryClient {
    async fn search(
        &self,
        query: &str,
        fields: &[&str],
        max_results: usize,
    ) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let token = self.tokens.access_token(&REQUIRED_SCOPES).await?;

        let url = format!("{}/users", self.base_url.trim_end_matches('/'));
        let select = fields.join(",");
        let top = max_results.to_string();
        let response = self
            .http
            .get(&url)
            .bearer_auth(token.secret().expose_secret())
            // $search requires the eventual-consistency read mode.
            .header("ConsistencyLevel", "eventual")
            .query(&[
                ("$search", query),
                ("$select", select.as_str()),
                ("$top", top.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DirectoryError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| DirectoryError::Request(e.to_string()))?;

        let users: UsersResponse = response
            .json()
            .await
            .map_err(|e| DirectoryError::InvalidResponse(e.to_string()))?;

        Ok(users.value)
    }
}
