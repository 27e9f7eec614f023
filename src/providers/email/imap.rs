//! IMAP mailbox access built on `async-imap`.
//!
//! # Protocol Details
//!
//! - Uses IMAP4rev1 (RFC 3501) via `async-imap`
//! - Implicit TLS (port 993 by default) through `tokio-rustls` with the
//!   webpki root store and the `ring` crypto provider
//! - One session per call: open, login, work, logout

use std::fmt::Debug;
use std::sync::Arc;

use async_imap::error::Error as ImapError;
use async_trait::async_trait;
use futures::io::{AsyncRead, AsyncWrite};
use futures::StreamExt;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

use super::{ImapBackend, MailError, MailboxSession, Result, SearchCriterion};
use crate::config::{Credentials, Endpoint};

/// Type alias for the IMAP session with TLS (using tokio-util compat layer).
type ImapSession = async_imap::Session<Compat<TlsStream<TcpStream>>>;

/// [`ImapBackend`] over implicit TLS.
#[derive(Debug, Clone, Default)]
pub struct AsyncImap;

impl AsyncImap {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }

    /// Establishes TLS connection to the IMAP server with futures compat wrapper.
    async fn connect_tls(endpoint: &Endpoint) -> Result<Compat<TlsStream<TcpStream>>> {
        let tcp_stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(|e| {
                MailError::Connection(format!("TCP connect to {} failed: {}", endpoint, e))
            })?;

        let connector = TlsConnector::from(Arc::new(tls_config()?));
        let server_name = ServerName::try_from(endpoint.host.clone())
            .map_err(|e| MailError::Connection(format!("invalid server name: {}", e)))?;

        let tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| MailError::Connection(format!("TLS handshake failed: {}", e)))?;

        Ok(tls_stream.compat())
    }
}

/// Client TLS settings with an explicit crypto provider, so no process-wide
/// default has to be installed.
fn tls_config() -> Result<ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    Ok(ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| MailError::Connection(format!("TLS configuration failed: {}", e)))?
        .with_root_certificates(roots)
        .with_no_client_auth())
}

/// Maps an `async-imap` error raised after login.
fn command_error(command: &str, err: ImapError) -> MailError {
    match err {
        ImapError::Io(e) => MailError::Connection(format!("{} failed: {}", command, e)),
        ImapError::ConnectionLost => {
            MailError::Connection(format!("{} failed: connection lost", command))
        }
        other => MailError::Protocol(format!("{} failed: {}", command, other)),
    }
}

/// Maps a failed LOGIN. Anything but a broken connection is a rejection.
fn login_error(err: ImapError) -> MailError {
    match err {
        ImapError::Io(io) => MailError::Connection(format!("IMAP login failed: {}", io)),
        ImapError::ConnectionLost => {
            MailError::Connection("IMAP login failed: connection lost".to_string())
        }
        other => MailError::Authentication(format!("IMAP login failed: {}", other)),
    }
}

async fn login<T>(
    client: async_imap::Client<T>,
    credentials: &Credentials,
) -> Result<async_imap::Session<T>>
where
    T: AsyncRead + AsyncWrite + Unpin + Debug + Send,
{
    client
        .login(&credentials.address, &credentials.secret)
        .await
        .map_err(|(e, _client)| login_error(e))
}

/// Fetches the RFC 822 source of `id`.
///
/// The response stream is always read to its end, even after a failed item,
/// so the session stays usable for the next command.
async fn fetch_message<T>(session: &mut async_imap::Session<T>, id: u32) -> Result<Vec<u8>>
where
    T: AsyncRead + AsyncWrite + Unpin + Debug + Send,
{
    let stream = session
        .fetch(id.to_string(), "RFC822")
        .await
        .map_err(|e| command_error("FETCH", e))?;
    futures::pin_mut!(stream);

    let mut body = None;
    let mut first_error = None;
    while let Some(item) = stream.next().await {
        match item {
            Ok(fetch) => {
                if body.is_none() {
                    body = fetch.body().map(<[u8]>::to_vec);
                }
            }
            Err(e) => {
                let fatal = matches!(e, ImapError::Io(_) | ImapError::ConnectionLost);
                first_error.get_or_insert(command_error("FETCH", e));
                // Nothing more will arrive on a broken connection.
                if fatal {
                    break;
                }
            }
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }
    body.ok_or_else(|| MailError::Protocol(format!("message {} returned no body", id)))
}

#[async_trait]
impl ImapBackend for AsyncImap {
    async fn open(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Box<dyn MailboxSession>> {
        let tls_stream = Self::connect_tls(endpoint).await?;
        let session = login(async_imap::Client::new(tls_stream), credentials).await?;

        tracing::debug!(imap = %endpoint, "IMAP session opened");
        Ok(Box::new(AsyncImapSession { session }))
    }
}

/// A logged-in `async-imap` session.
pub struct AsyncImapSession {
    session: ImapSession,
}

#[async_trait]
impl MailboxSession for AsyncImapSession {
    async fn select(&mut self, folder: &str) -> Result<()> {
        let mailbox = self
            .session
            .select(folder)
            .await
            .map_err(|e| command_error("SELECT", e))?;

        tracing::debug!(folder, exists = mailbox.exists, "folder selected");
        Ok(())
    }

    async fn search(&mut self, criterion: SearchCriterion) -> Result<Vec<u32>> {
        let ids = self
            .session
            .search(criterion.as_imap())
            .await
            .map_err(|e| match e {
                ImapError::Io(_) | ImapError::ConnectionLost => command_error("SEARCH", e),
                other => MailError::Protocol(format!("failed to search emails: {}", other)),
            })?;

        Ok(ids.into_iter().collect())
    }

    async fn fetch(&mut self, id: u32) -> Result<Vec<u8>> {
        fetch_message(&mut self.session, id).await
    }

    async fn logout(&mut self) -> Result<()> {
        self.session
            .logout()
            .await
            .map_err(|e| command_error("LOGOUT", e))
    }
}
