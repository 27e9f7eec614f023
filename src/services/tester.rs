//! Connectivity check for both mail servers.

use std::sync::Arc;

use crate::config::{Credentials, ProviderProfile};
use crate::domain::ConnectionReport;
use crate::providers::email::{ImapBackend, MailError, Result, SmtpBackend};

/// Logs in to the SMTP server and then the IMAP server, sending and reading nothing.
pub struct ConnectionTester {
    credentials: Credentials,
    smtp: Arc<dyn SmtpBackend>,
    imap: Arc<dyn ImapBackend>,
}

impl ConnectionTester {
    /// Creates a tester that logs in with `credentials` on both transports.
    pub fn new(
        credentials: Credentials,
        smtp: Arc<dyn SmtpBackend>,
        imap: Arc<dyn ImapBackend>,
    ) -> Self {
        Self {
            credentials,
            smtp,
            imap,
        }
    }

    /// Verifies both endpoints of `profile`. The first failing leg ends the test.
    pub async fn test(&self, profile: &ProviderProfile) -> Result<ConnectionReport> {
        if !self.credentials.is_present() {
            return Err(MailError::NotConfigured);
        }
        if !profile.smtp.is_configured() || !profile.imap.is_configured() {
            return Err(MailError::Configuration(
                "SMTP_SERVER and IMAP_SERVER must be set for the custom provider".to_string(),
            ));
        }

        self.smtp.verify(&profile.smtp, &self.credentials).await?;

        let mut session = self.imap.open(&profile.imap, &self.credentials).await?;
        session.logout().await?;

        tracing::info!(
            provider = %profile.kind,
            smtp = %profile.smtp,
            imap = %profile.imap,
            "email connection verified"
        );

        Ok(ConnectionReport {
            address: self.credentials.address.clone(),
            provider: profile.kind,
            smtp_endpoint: profile.smtp.to_string(),
            imap_endpoint: profile.imap.to_string(),
        })
    }
}
