//! Mail transport seam and its two implementations: Graph `sendMail` over
//! HTTP, and plain SMTP via lettre.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};

use crate::auth::{REQUIRED_SCOPES, TokenSource};
use crate::error::MailError;
use crate::mail::message::OutgoingMail;

/// Mail transport seam. Implementations report delivery failure as an error;
/// converting that into a user-facing outcome is the dispatcher's job.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

// ── Graph transport ─────────────────────────────────────────────────

/// Sends through Graph `/me/sendMail` on behalf of the signed-in user.
pub struct GraphMailTransport {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl GraphMailTransport {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            tokens,
        }
    }
}

#[async_trait]
impl MailTransport for GraphMailTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let token = self.tokens.access_token(&REQUIRED_SCOPES).await?;

        let body = serde_json::json!({
            "message": {
                "subject": mail.subject,
                "body": {
                    "contentType": "Text",
                    "content": mail.body,
                },
                "toRecipients": [{
                    "emailAddress": {
                        "address": mail.to_address,
                        "name": mail.to_name,
                    },
                }],
            },
            "saveToSentItems": mail.save_copy,
        });

        let url = format!("{}/me/sendMail", self.base_url.trim_end_matches('/'));
        self.http
            .post(&url)
            .bearer_auth(token.secret().expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| MailError::Transport(e.to_string()))?;

        tracing::info!(to = %mail.to_address, "Mail submitted via Graph");
        Ok(())
    }
}

// ── SMTP transport ──────────────────────────────────────────────────

/// SMTP relay configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl SmtpConfig {
    /// Build config from environment variables.
    /// Returns `None` if `SMTP_HOST` is not set (Graph transport is used instead).
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;

        let port: u16 = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);

        let username = std::env::var("SMTP_USERNAME").unwrap_or_default();
        let password = SecretString::from(std::env::var("SMTP_PASSWORD").unwrap_or_default());
        let from_address = std::env::var("SMTP_FROM_ADDRESS").unwrap_or_else(|_| username.clone());

        Some(Self {
            host,
            port,
            username,
            password,
            from_address,
        })
    }
}

/// SMTP transport via lettre. SMTP has no sent-items folder, so the
/// no-copy policy on [`OutgoingMail`] holds trivially.
pub struct SmtpMailTransport {
    config: SmtpConfig,
}

impl SmtpMailTransport {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let to_address =
            mail.to_address
                .parse::<lettre::Address>()
                .map_err(|e| MailError::Address {
                    address: mail.to_address.clone(),
                    reason: e.to_string(),
                })?;
        let to = Mailbox::new(Some(mail.to_name.clone()), to_address);

        let from: Mailbox =
            self.config
                .from_address
                .parse()
                .map_err(|e: lettre::address::AddressError| MailError::Address {
                    address: self.config.from_address.clone(),
                    reason: e.to_string(),
                })?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject.clone())
            .body(mail.body.clone())
            .map_err(|e| MailError::Compose(e.to_string()))?;

        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
            .map_err(|e| MailError::Transport(format!("SMTP relay error: {e}")))?
            .port(self.config.port)
            .credentials(creds)
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(format!("SMTP send failed: {e}")))?;

        tracing::info!(to = %mail.to_address, "Mail submitted via SMTP");
        Ok(())
    }
}
