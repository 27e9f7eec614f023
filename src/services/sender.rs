//! Outbound mail.
//!
//! [`MailSender`] composes a MIME message from an [`OutboundMessage`] and hands
//! it to an [`SmtpBackend`]. BCC recipients go into the SMTP envelope only and
//! never appear in the message headers.

use std::sync::Arc;

use chrono::Local;
use lettre::address::{Address, Envelope};
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::Message;

use crate::config::{Credentials, ProviderProfile};
use crate::domain::{BodyFormat, OutboundMessage, SendReceipt};
use crate::providers::email::{ComposedMessage, MailError, Result, SmtpBackend};

/// Sends one message per call over a fresh SMTP session.
pub struct MailSender {
    credentials: Credentials,
    backend: Arc<dyn SmtpBackend>,
}

impl MailSender {
    /// Creates a sender that authenticates with `credentials`.
    pub fn new(credentials: Credentials, backend: Arc<dyn SmtpBackend>) -> Self {
        Self {
            credentials,
            backend,
        }
    }

    /// Builds the MIME message and SMTP envelope without any I/O.
    ///
    /// Headers: From, To, Subject, and Cc when CC recipients are given. The
    /// envelope lists To, then CC, then BCC.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::InvalidRequest`] if any address cannot be parsed.
    pub fn compose(from: &str, message: &OutboundMessage) -> Result<ComposedMessage> {
        let from = parse_mailbox("from", from)?;
        let to = parse_mailbox("to", &message.to)?;
        let cc = message
            .cc_list()
            .into_iter()
            .map(|addr| parse_mailbox("cc", addr))
            .collect::<Result<Vec<_>>>()?;
        let bcc = message
            .bcc_list()
            .into_iter()
            .map(|addr| parse_mailbox("bcc", addr))
            .collect::<Result<Vec<_>>>()?;

        let mut builder = Message::builder()
            .from(from.clone())
            .to(to.clone())
            .subject(message.subject.clone());
        for mailbox in &cc {
            builder = builder.cc(mailbox.clone());
        }

        let body = match message.format {
            BodyFormat::Plain => SinglePart::plain(message.body.clone()),
            BodyFormat::Html => SinglePart::html(message.body.clone()),
        };

        let email = builder
            .multipart(MultiPart::mixed().singlepart(body))
            .map_err(|e| MailError::InvalidRequest(format!("failed to build message: {}", e)))?;

        let recipients: Vec<Address> = std::iter::once(&to)
            .chain(&cc)
            .chain(&bcc)
            .map(|mailbox| mailbox.email.clone())
            .collect();
        let envelope = Envelope::new(Some(from.email), recipients)
            .map_err(|e| MailError::InvalidRequest(format!("invalid envelope: {}", e)))?;

        Ok(ComposedMessage {
            message: email,
            envelope,
        })
    }

    /// Sends `message` through the profile's SMTP server.
    ///
    /// Fails with [`MailError::NotConfigured`] before any I/O when credentials
    /// are missing.
    pub async fn send(
        &self,
        message: &OutboundMessage,
        profile: &ProviderProfile,
    ) -> Result<SendReceipt> {
        if !self.credentials.is_present() {
            return Err(MailError::NotConfigured);
        }
        if !profile.smtp.is_configured() {
            return Err(MailError::Configuration(
                "SMTP_SERVER is not set for the custom provider".to_string(),
            ));
        }

        let composed = Self::compose(&self.credentials.address, message)?;

        self.backend
            .send(&profile.smtp, &self.credentials, &composed)
            .await
            .map_err(|e| {
                tracing::warn!(smtp = %profile.smtp, error = %e, "email send failed");
                e
            })?;

        tracing::info!(
            smtp = %profile.smtp,
            to = %message.to,
            recipients = composed.envelope.to().len(),
            "email sent"
        );

        Ok(SendReceipt {
            to: message.to.clone(),
            subject: message.subject.clone(),
            sent_at: Local::now(),
        })
    }
}

fn parse_mailbox(field: &str, value: &str) -> Result<Mailbox> {
    value.trim().parse().map_err(|e| {
        MailError::InvalidRequest(format!("invalid {} address {:?}: {}", field, value, e))
    })
}
