//! Presentation result handed back to the web layer.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything the presentation layer needs about one orchestration run.
/// Which optional fields are populated depends on how far the run got;
/// the view is always coherent. A raw fault never reaches the caller;
/// only the consent challenge travels separately.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceView {
    pub user_name: Option<String>,
    pub requires_authentication: bool,
    pub requires_consent: bool,
    pub ready_for_compliance: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComplianceView {
    /// View for an unauthenticated request: sign-in prompt, nothing else.
    pub fn sign_in_required() -> Self {
        Self {
            requires_authentication: true,
            ..Default::default()
        }
    }

    /// View for an authenticated user who has not yet granted consent.
    pub fn consent_pending(user_name: impl Into<String>) -> Self {
        Self {
            user_name: Some(user_name.into()),
            requires_consent: true,
            ..Default::default()
        }
    }

    /// View for a consented user, ready for (or mid-way through) a run.
    pub fn ready(user_name: Option<String>) -> Self {
        Self {
            user_name,
            ready_for_compliance: true,
            ..Default::default()
        }
    }
}
