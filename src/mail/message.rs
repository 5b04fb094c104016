//! Outgoing message composition.

/// A composed plain-text message handed to a [`super::MailTransport`].
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to_address: String,
    /// Display name shown alongside the address: the original identifier
    /// the recipient was resolved from.
    pub to_name: String,
    pub subject: String,
    pub body: String,
    /// Whether the transport should keep a copy in the sender's sent items.
    pub save_copy: bool,
}

impl OutgoingMail {
    /// Compose the compliance-report notification for a resolved recipient.
    /// Policy: no copy is kept in the sender's sent items.
    pub fn compliance_report(
        to_address: impl Into<String>,
        to_name: impl Into<String>,
        body: impl Into<String>,
        file_name: &str,
    ) -> Self {
        Self {
            to_address: to_address.into(),
            to_name: to_name.into(),
            subject: format!("Compliance report for file {file_name}"),
            body: body.into(),
            save_copy: false,
        }
    }
}
