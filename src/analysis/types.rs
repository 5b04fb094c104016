//! Analysis request/result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies the artifact to analyze. An empty file name is accepted; the
/// analysis simply runs over an empty file context.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplianceRequest {
    #[serde(default)]
    pub file_name: String,
}

impl ComplianceRequest {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

/// Result of one compliance analysis run. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceResult {
    pub analysis_text: String,
    pub file_author: String,
    pub timestamp: DateTime<Utc>,
}

/// One row retrieved from the content index.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub file_author: String,
}
