//! Agent-facing email tools.
//!
//! [`MailTools`] exposes four operations that always return a human-readable
//! reply. Failures never escape as errors: they are rendered into the reply
//! text, prefixed with ❌.
//!
//! The provider profile is resolved from [`Settings`] on every call, so an
//! unknown provider name falls back to Gmail with a warning in the log.

pub mod format;

use std::sync::Arc;

use chrono::Local;

use crate::config::{resolve, ProviderProfile, Settings};
use crate::domain::OutboundMessage;
use crate::providers::email::{AsyncImap, ImapBackend, LettreSmtp, SmtpBackend};
use crate::services::{ConnectionTester, MailReader, MailSender, ReadRequest};

/// Smallest number of messages a read returns.
pub const MIN_READ_LIMIT: usize = 1;
/// Largest number of messages a read returns.
pub const MAX_READ_LIMIT: usize = 20;
/// Read limit used when the caller does not supply one.
pub const DEFAULT_READ_LIMIT: i64 = 5;

/// The four email tools, wired to one set of settings.
pub struct MailTools {
    settings: Settings,
    sender: MailSender,
    reader: MailReader,
    tester: ConnectionTester,
}

impl MailTools {
    /// Creates tools that talk to real SMTP and IMAP servers.
    pub fn new(settings: Settings) -> Self {
        Self::with_backends(settings, Arc::new(LettreSmtp::new()), Arc::new(AsyncImap::new()))
    }

    /// Creates tools over caller-supplied transports.
    pub fn with_backends(
        settings: Settings,
        smtp: Arc<dyn SmtpBackend>,
        imap: Arc<dyn ImapBackend>,
    ) -> Self {
        let credentials = settings.credentials();
        let sender = MailSender::new(credentials.clone(), smtp.clone());
        let reader = MailReader::new(credentials.clone(), imap.clone(), settings.read.fetch_policy);
        let tester = ConnectionTester::new(credentials, smtp, imap);

        Self {
            settings,
            sender,
            reader,
            tester,
        }
    }

    fn profile(&self) -> ProviderProfile {
        resolve(&self.settings.provider, &self.settings.custom).profile
    }

    /// Sends a plain-text email, with optional comma-separated CC recipients.
    pub async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        cc: Option<&str>,
    ) -> String {
        let message = OutboundMessage::plain(to, subject, body).with_cc(cc);

        match self.sender.send(&message, &self.profile()).await {
            Ok(receipt) => format::sent(&receipt),
            Err(e) => format::send_failed(&e),
        }
    }

    /// Lists the most recent messages in the configured folder, newest first.
    ///
    /// `limit` is clamped to `1..=20`. `unread_only` is true only for the
    /// string `"true"`, compared case-insensitively.
    pub async fn read_recent_emails(&self, limit: i64, unread_only: &str) -> String {
        let unread_only = parse_flag(unread_only);
        let request = ReadRequest::new(
            self.settings.read.folder.clone(),
            clamp_limit(limit),
            unread_only,
        );

        match self.reader.read(&request, &self.profile()).await {
            Ok(outcome) => format::inbox(&outcome, unread_only),
            Err(e) => format::read_failed(&e),
        }
    }

    /// Logs in to both servers and reports the endpoints in use.
    pub async fn test_email_connection(&self) -> String {
        match self.tester.test(&self.profile()).await {
            Ok(report) => format::connection(&report),
            Err(e) => format::connection_failed(&e),
        }
    }

    /// Sends a timestamped notification email.
    pub async fn send_quick_notification(&self, recipient: &str, message: &str) -> String {
        let now = Local::now();
        let email = OutboundMessage::plain(
            recipient,
            format::notification_subject(&now),
            format::notification_body(&now, message),
        );

        match self.sender.send(&email, &self.profile()).await {
            Ok(_) => format::notification_sent(recipient, message),
            Err(e) => format::notification_failed(&e),
        }
    }
}

/// Clamps a requested read limit to `1..=20`.
pub fn clamp_limit(limit: i64) -> usize {
    limit.clamp(MIN_READ_LIMIT as i64, MAX_READ_LIMIT as i64) as usize
}

/// Parses a tool flag. Only `"true"` (any case) is true.
pub fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
