//! Notification dispatch — resolve the recipient, compose, attempt delivery.
//!
//! Dispatch never raises. Every path, including transport failure, folds
//! into a `NotificationOutcome` so an analysis result is never lost to a
//! notification problem.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::directory::RecipientResolver;
use crate::mail::message::OutgoingMail;
use crate::mail::transport::MailTransport;

/// Outcome of a notification attempt: a success confirmation (including the
/// resolved address) or a human-readable failure reason.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationOutcome {
    pub success: bool,
    pub message: String,
}

impl NotificationOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Composes and delivers the compliance-report notification.
pub struct NotificationDispatcher {
    resolver: RecipientResolver,
    transport: Arc<dyn MailTransport>,
}

impl NotificationDispatcher {
    pub fn new(resolver: RecipientResolver, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            resolver,
            transport,
        }
    }

    /// Resolve `recipient` and deliver `content` as the compliance report
    /// for `file_name`. Unresolvable recipients skip delivery entirely.
    pub async fn dispatch(
        &self,
        recipient: &str,
        content: &str,
        file_name: &str,
    ) -> NotificationOutcome {
        info!(recipient, file = file_name, "Sending email notification");

        let Some(address) = self.resolver.resolve(recipient).await else {
            let message = format!(
                "Could not resolve email address for recipient '{recipient}'. \
                 Please verify the user exists in your organization."
            );
            warn!("{message}");
            return NotificationOutcome::failure(message);
        };

        let mail = OutgoingMail::compliance_report(&address, recipient, content, file_name);

        match self.transport.send(&mail).await {
            Ok(()) => {
                let message =
                    format!("Email notification successfully sent to {recipient} ({address})");
                info!("{message}");
                NotificationOutcome::success(message)
            }
            Err(e) => {
                error!(recipient, error = %e, "Error sending email with findings");
                NotificationOutcome::failure(format!("Failed to send email to {recipient}: {e}"))
            }
        }
    }
}
