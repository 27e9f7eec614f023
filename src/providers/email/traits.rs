//! Protocol seams for SMTP and IMAP.
//!
//! The services talk to mail servers only through these traits. Real
//! implementations live in [`smtp`](super::smtp) and [`imap`](super::imap);
//! tests substitute mocks so no socket is ever opened.

use async_trait::async_trait;
use lettre::address::Envelope;
use lettre::Message;

use crate::config::{Credentials, Endpoint};

/// Result type alias for mail operations.
pub type Result<T> = std::result::Result<T, MailError>;

/// Errors that can occur during mail operations.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Address or password missing. Raised before any I/O.
    #[error(
        "email credentials not configured, check EMAIL_ADDRESS and EMAIL_PASSWORD environment variables"
    )]
    NotConfigured,

    /// Other configuration problem, such as a custom provider without a server.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The server rejected the login.
    #[error("authentication failed, check credentials or use an app-specific password ({0})")]
    Authentication(String),

    /// The session was established but a command was refused.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Socket or TLS failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// The request itself was malformed, such as an unparseable address.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Anything not covered above.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Coarse classification of a [`MailError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Authentication,
    Protocol,
    Connection,
    Unexpected,
}

impl MailError {
    /// Returns the failure class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConfigured | Self::Configuration(_) => ErrorKind::Configuration,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Connection(_) => ErrorKind::Connection,
            Self::InvalidRequest(_) | Self::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}

/// IMAP search criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCriterion {
    /// Every message in the folder.
    All,
    /// Messages without the `\Seen` flag.
    Unseen,
}

impl SearchCriterion {
    /// Picks `Unseen` when `unread_only` is set.
    pub fn from_unread_only(unread_only: bool) -> Self {
        if unread_only {
            Self::Unseen
        } else {
            Self::All
        }
    }

    /// IMAP SEARCH key.
    pub fn as_imap(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Unseen => "UNSEEN",
        }
    }
}

/// A message ready for transmission.
///
/// The envelope carries every transmit-time recipient (To, CC and BCC), while
/// the message headers only name To and CC.
#[derive(Debug, Clone)]
pub struct ComposedMessage {
    /// The RFC 5322 message.
    pub message: Message,
    /// SMTP envelope (MAIL FROM / RCPT TO).
    pub envelope: Envelope,
}

impl ComposedMessage {
    /// Envelope recipients as strings, in transmit order.
    pub fn recipients(&self) -> Vec<String> {
        self.envelope.to().iter().map(|a| a.to_string()).collect()
    }
}

/// Outbound mail transport.
///
/// Each call opens its own session and closes it before returning, whether it
/// succeeds or not.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmtpBackend: Send + Sync {
    /// Connects, upgrades with STARTTLS, authenticates and transmits `composed`.
    async fn send(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
        composed: &ComposedMessage,
    ) -> Result<()>;

    /// Connects, upgrades with STARTTLS, authenticates and disconnects.
    async fn verify(&self, endpoint: &Endpoint, credentials: &Credentials) -> Result<()>;
}

/// Mailbox access.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImapBackend: Send + Sync {
    /// Opens an authenticated session over implicit TLS.
    async fn open(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Box<dyn MailboxSession>>;
}

/// An authenticated IMAP session.
///
/// Callers must call [`logout`](MailboxSession::logout) once they are done,
/// including after a failed command.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailboxSession: Send {
    /// Selects `folder`.
    async fn select(&mut self, folder: &str) -> Result<()>;

    /// Returns matching message numbers in server order.
    async fn search(&mut self, criterion: SearchCriterion) -> Result<Vec<u32>>;

    /// Fetches the full RFC 822 source of message `id`.
    async fn fetch(&mut self, id: u32) -> Result<Vec<u8>>;

    /// Ends the session.
    async fn logout(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_criterion_keys() {
        assert_eq!(SearchCriterion::from_unread_only(true).as_imap(), "UNSEEN");
        assert_eq!(SearchCriterion::from_unread_only(false).as_imap(), "ALL");
    }

    #[test]
    fn mail_error_display() {
        let auth = MailError::Authentication("535 5.7.8 rejected".to_string());
        assert!(auth.to_string().starts_with("authentication failed"));
        assert!(auth.to_string().contains("app-specific password"));

        assert!(MailError::NotConfigured
            .to_string()
            .contains("credentials not configured"));

        let proto = MailError::Protocol("failed to search emails".to_string());
        assert_eq!(proto.to_string(), "protocol error: failed to search emails");
    }

    #[test]
    fn mail_error_kinds() {
        assert_eq!(MailError::NotConfigured.kind(), ErrorKind::Configuration);
        assert_eq!(
            MailError::Configuration("x".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            MailError::Authentication("x".into()).kind(),
            ErrorKind::Authentication
        );
        assert_eq!(MailError::Protocol("x".into()).kind(), ErrorKind::Protocol);
        assert_eq!(MailError::Connection("x".into()).kind(), ErrorKind::Connection);
        assert_eq!(MailError::Unexpected("x".into()).kind(), ErrorKind::Unexpected);
    }
}
