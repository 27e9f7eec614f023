//! Email transport seams and implementations.
//!
//! This module contains the [`SmtpBackend`], [`ImapBackend`] and
//! [`MailboxSession`] traits and their network implementations:
//!
//! - [`LettreSmtp`] - SMTP submission with STARTTLS via `lettre`
//! - [`AsyncImap`] - IMAP over implicit TLS via `async-imap`
//!
//! # Architecture
//!
//! Services depend only on the traits, which keeps every network touch point
//! replaceable in tests. Each call acquires its own session and releases it
//! before returning:
//!
//! - connect and authenticate
//! - perform one operation (send, or select/search/fetch)
//! - disconnect
//!
//! # Example
//!
//! ```ignore
//! use mailtools::config::{resolve, Settings};
//! use mailtools::providers::email::{AsyncImap, ImapBackend, SearchCriterion};
//!
//! async fn count_unread(settings: &Settings) -> mailtools::providers::email::Result<usize> {
//!     let profile = resolve(&settings.provider, &settings.custom).profile;
//!     let mut session = AsyncImap::new().open(&profile.imap, &settings.credentials()).await?;
//!     session.select("INBOX").await?;
//!     let ids = session.search(SearchCriterion::Unseen).await;
//!     session.logout().await?;
//!     Ok(ids?.len())
//! }
//! ```

mod imap;
mod smtp;
mod traits;

pub use imap::{AsyncImap, AsyncImapSession};
pub use smtp::LettreSmtp;
pub use traits::{
    ComposedMessage, ErrorKind, ImapBackend, MailError, MailboxSession, Result, SearchCriterion,
    SmtpBackend,
};

#[cfg(test)]
pub use traits::{MockImapBackend, MockMailboxSession, MockSmtpBackend};
