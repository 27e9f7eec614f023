//! Success payloads returned by the mail services.
//!
//! Failures are carried by [`MailError`](crate::providers::email::MailError);
//! these types are the `Ok` side of each operation.

use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};

use super::InboundMessageSummary;
use crate::config::ProviderKind;

/// Proof of a completed send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Primary recipient.
    pub to: String,
    /// Subject that was sent.
    pub subject: String,
    /// When the server accepted the message.
    pub sent_at: DateTime<Local>,
}

impl SendReceipt {
    /// ISO-8601 completion time.
    pub fn timestamp(&self) -> String {
        self.sent_at.to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    /// One-line description.
    pub fn summary(&self) -> String {
        format!("Email sent successfully to {}", self.to)
    }
}

/// Messages read from one folder, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadOutcome {
    /// Folder that was read.
    pub folder: String,
    /// Summaries, newest first.
    pub messages: Vec<InboundMessageSummary>,
    /// Messages omitted because they could not be fetched or parsed.
    pub skipped: usize,
}

impl ReadOutcome {
    /// Number of returned messages.
    pub fn count(&self) -> usize {
        self.messages.len()
    }

    /// One-line description.
    pub fn summary(&self) -> String {
        format!("Retrieved {} emails from {}", self.count(), self.folder)
    }
}

/// Result of probing both mail servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionReport {
    /// Configured mailbox address.
    pub address: String,
    /// Provider the endpoints came from.
    pub provider: ProviderKind,
    /// SMTP `host:port`.
    pub smtp_endpoint: String,
    /// IMAP `host:port`.
    pub imap_endpoint: String,
}

impl ConnectionReport {
    /// Headline for a successful check.
    pub fn summary(&self) -> String {
        "Email Connection Successful!".to_string()
    }
}
