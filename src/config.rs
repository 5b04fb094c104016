//! Service configuration, built from environment variables.

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};
use crate::mail::SmtpConfig;

/// Default Graph API base URL.
const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// File analyzed when a trigger carries no explicit request.
const DEFAULT_COMPLIANCE_FILE: &str = "compliance-check";

/// Top-level service configuration.
pub struct AppConfig {
    pub http_port: u16,
    pub graph_base_url: String,
    /// Delegated bearer token for Graph calls, minted and refreshed by the
    /// identity sidecar.
    pub graph_token: SecretString,
    pub consent_url: String,
    pub default_file: String,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    /// SMTP relay; `None` routes mail through Graph `sendMail` instead.
    pub smtp: Option<SmtpConfig>,
}

/// Content search index settings.
pub struct RetrievalConfig {
    pub endpoint: String,
    pub index: String,
}

impl AppConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_port: u16 = std::env::var("COMPLIANCE_HTTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let graph_base_url = std::env::var("GRAPH_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GRAPH_BASE_URL.to_string());

        let graph_token = SecretString::from(
            std::env::var("GRAPH_ACCESS_TOKEN")
                .map_err(|_| ConfigError::MissingEnvVar("GRAPH_ACCESS_TOKEN".into()))?,
        );

        let consent_url =
            std::env::var("CONSENT_URL").unwrap_or_else(|_| "/auth/consent".to_string());

        let default_file = std::env::var("COMPLIANCE_DEFAULT_FILE")
            .unwrap_or_else(|_| DEFAULT_COMPLIANCE_FILE.to_string());

        let backend = match std::env::var("LLM_BACKEND").as_deref() {
            Err(_) | Ok("anthropic") => LlmBackend::Anthropic,
            Ok("openai") => LlmBackend::OpenAi,
            Ok(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "LLM_BACKEND".into(),
                    message: format!("unknown backend '{other}'"),
                });
            }
        };

        let api_key = SecretString::from(match backend {
            LlmBackend::Anthropic => std::env::var("ANTHROPIC_API_KEY")
                .map_err(|_| ConfigError::MissingEnvVar("ANTHROPIC_API_KEY".into()))?,
            LlmBackend::OpenAi => std::env::var("OPENAI_API_KEY")
                .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".into()))?,
        });

        let model = std::env::var("LLM_MODEL")
            .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());

        let retrieval = RetrievalConfig {
            endpoint: std::env::var("SEARCH_ENDPOINT")
                .map_err(|_| ConfigError::MissingEnvVar("SEARCH_ENDPOINT".into()))?,
            index: std::env::var("SEARCH_INDEX").unwrap_or_else(|_| "knowledge".to_string()),
        };

        Ok(Self {
            http_port,
            graph_base_url,
            graph_token,
            consent_url,
            default_file,
            llm: LlmConfig {
                backend,
                api_key,
                model,
            },
            retrieval,
            smtp: SmtpConfig::from_env(),
        })
    }
}
