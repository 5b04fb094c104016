//! Outbound mail — composition, transport, and notification dispatch.

pub mod dispatcher;
pub mod message;
pub mod transport;

pub use dispatcher::{NotificationDispatcher, NotificationOutcome};
pub use message::OutgoingMail;
pub use transport::{GraphMailTransport, MailTransport, SmtpConfig, SmtpMailTransport};
