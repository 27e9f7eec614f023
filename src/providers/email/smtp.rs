//! SMTP transport built on `lettre`.
//!
//! Every call builds a fresh, unpooled `AsyncSmtpTransport`, so a session
//! lives exactly as long as one `send` or `verify`. `lettre` closes the
//! connection with QUIT on success and aborts it on error.

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use super::{ComposedMessage, MailError, Result, SmtpBackend};
use crate::config::{Credentials, Endpoint};

/// SMTP reply codes that mean the login was refused.
const AUTH_REJECTION_CODES: &[&str] = &["530", "534", "535"];

/// [`SmtpBackend`] using STARTTLS submission.
#[derive(Debug, Clone, Default)]
pub struct LettreSmtp;

impl LettreSmtp {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }

    fn transport(
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let smtp_credentials =
            SmtpCredentials::new(credentials.address.clone(), credentials.secret.clone());

        Ok(
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&endpoint.host)
                .map_err(|e| MailError::Connection(format!("SMTP relay error: {}", e)))?
                .port(endpoint.port)
                .credentials(smtp_credentials)
                .build(),
        )
    }
}

/// Returns true when an SMTP reply code signals rejected credentials.
pub(crate) fn is_auth_rejection(code: &str) -> bool {
    AUTH_REJECTION_CODES.contains(&code)
}

fn classify(err: lettre::transport::smtp::Error) -> MailError {
    if let Some(code) = err.status() {
        if is_auth_rejection(&code.to_string()) {
            return MailError::Authentication(err.to_string());
        }
    }

    if err.is_permanent() || err.is_transient() || err.is_response() {
        MailError::Protocol(format!("SMTP error: {}", err))
    } else {
        MailError::Connection(format!("SMTP error: {}", err))
    }
}

#[async_trait]
impl SmtpBackend for LettreSmtp {
    async fn send(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
        composed: &ComposedMessage,
    ) -> Result<()> {
        let mailer = Self::transport(endpoint, credentials)?;

        let response = mailer
            .send_raw(&composed.envelope, &composed.message.formatted())
            .await
            .map_err(classify)?;

        tracing::debug!(
            smtp = %endpoint,
            code = %response.code(),
            recipients = composed.envelope.to().len(),
            "SMTP transaction accepted"
        );
        Ok(())
    }

    async fn verify(&self, endpoint: &Endpoint, credentials: &Credentials) -> Result<()> {
        let mailer = Self::transport(endpoint, credentials)?;

        let connected = mailer.test_connection().await.map_err(classify)?;
        if !connected {
            return Err(MailError::Connection(format!(
                "SMTP server {} did not answer NOOP",
                endpoint
            )));
        }

        tracing::debug!(smtp = %endpoint, "SMTP login verified");
        Ok(())
    }
}
