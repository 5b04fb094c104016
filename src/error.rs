//! Error types for Compliance Assist.

use crate::auth::ConsentChallenge;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Authentication and delegated-consent errors.
///
/// `ConsentRequired` is a control-flow signal rather than a failure: it must
/// travel unmodified up to the request layer, which answers it with an
/// interactive consent redirect.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Consent required for scopes: {0}")]
    ConsentRequired(ConsentChallenge),

    #[error("User is not authenticated")]
    NotAuthenticated,

    #[error("Token acquisition failed: {0}")]
    TokenAcquisition(String),
}

/// Directory search errors. A failure here is never fatal to recipient
/// resolution; the resolver logs it and moves to the next strategy.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Directory search request failed: {0}")]
    Request(String),

    #[error("Unexpected directory response: {0}")]
    InvalidResponse(String),

    #[error("Token acquisition failed: {0}")]
    Token(String),
}

impl From<AuthError> for DirectoryError {
    fn from(err: AuthError) -> Self {
        Self::Token(err.to_string())
    }
}

/// Mail composition and transport errors. Converted into
/// `NotificationOutcome` values at the dispatcher; never propagated further.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid mail address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("Failed to build mail message: {0}")]
    Compose(String),

    #[error("Mail transport failed: {0}")]
    Transport(String),

    #[error("Token acquisition failed: {0}")]
    Token(String),
}

impl From<AuthError> for MailError {
    fn from(err: AuthError) -> Self {
        Self::Token(err.to_string())
    }
}

/// Compliance analysis errors (retrieval + LLM step).
///
/// `ConsentRequired` carries the same challenge as `AuthError::ConsentRequired`
/// and gets the same treatment: re-raised unchanged by the orchestrator,
/// matched before the broad failure arm.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Consent required for scopes: {0}")]
    ConsentRequired(ConsentChallenge),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

impl From<AuthError> for AnalysisError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::ConsentRequired(challenge) => Self::ConsentRequired(challenge),
            other => Self::Retrieval(other.to_string()),
        }
    }
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
