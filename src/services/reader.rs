//! Mailbox reading.
//!
//! [`MailReader`] opens one IMAP session per call, searches a folder, fetches
//! the newest messages and reduces each to an [`InboundMessageSummary`]. The
//! session is logged out on every exit path.

use std::sync::Arc;

use mailparse::{MailHeaderMap, ParsedMail};

use crate::config::{Credentials, FetchPolicy, ProviderProfile};
use crate::domain::{preview, InboundMessageSummary, ReadOutcome};
use crate::providers::email::{ImapBackend, MailError, MailboxSession, Result, SearchCriterion};

/// Parameters for one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    /// Folder to select.
    pub folder: String,
    /// Maximum number of messages to return. Expected in `1..=20`.
    pub limit: usize,
    /// Only return messages without the `\Seen` flag.
    pub unread_only: bool,
}

impl ReadRequest {
    /// Creates a request for `folder`.
    pub fn new(folder: impl Into<String>, limit: usize, unread_only: bool) -> Self {
        Self {
            folder: folder.into(),
            limit,
            unread_only,
        }
    }
}

/// Reads recent messages over a fresh IMAP session.
pub struct MailReader {
    credentials: Credentials,
    backend: Arc<dyn ImapBackend>,
    policy: FetchPolicy,
}

impl MailReader {
    /// Creates a reader with the given per-message failure policy.
    pub fn new(
        credentials: Credentials,
        backend: Arc<dyn ImapBackend>,
        policy: FetchPolicy,
    ) -> Self {
        Self {
            credentials,
            backend,
            policy,
        }
    }

    /// Returns the newest `request.limit` messages, newest first.
    pub async fn read(
        &self,
        request: &ReadRequest,
        profile: &ProviderProfile,
    ) -> Result<ReadOutcome> {
        if !self.credentials.is_present() {
            return Err(MailError::NotConfigured);
        }
        if !profile.imap.is_configured() {
            return Err(MailError::Configuration(
                "IMAP_SERVER is not set for the custom provider".to_string(),
            ));
        }

        let mut session = self.backend.open(&profile.imap, &self.credentials).await?;
        let result = self.collect(session.as_mut(), request).await;

        if let Err(e) = session.logout().await {
            tracing::debug!(imap = %profile.imap, error = %e, "IMAP logout failed");
        }

        match &result {
            Ok(outcome) => tracing::info!(
                imap = %profile.imap,
                folder = %outcome.folder,
                count = outcome.count(),
                skipped = outcome.skipped,
                "{}",
                outcome.summary()
            ),
            Err(e) => tracing::warn!(imap = %profile.imap, error = %e, "email read failed"),
        }
        result
    }

    async fn collect(
        &self,
        session: &mut dyn MailboxSession,
        request: &ReadRequest,
    ) -> Result<ReadOutcome> {
        session.select(&request.folder).await?;

        let criterion = SearchCriterion::from_unread_only(request.unread_only);
        let ids = session.search(criterion).await?;

        let mut messages = Vec::new();
        let mut skipped = 0;

        for id in newest_first(ids, request.limit) {
            let summary = match session.fetch(id).await {
                Ok(raw) => summarize(id, &raw, &self.credentials.address),
                Err(e) => Err(e),
            };

            match (summary, self.policy) {
                (Ok(summary), _) => messages.push(summary),
                (Err(e), FetchPolicy::Strict) => return Err(e),
                (Err(e), FetchPolicy::Lenient) => {
                    tracing::warn!(id, error = %e, "skipping message");
                    skipped += 1;
                }
            }
        }

        Ok(ReadOutcome {
            folder: request.folder.clone(),
            messages,
            skipped,
        })
    }
}

/// Keeps the last `limit` ids in ascending order and returns them newest first.
pub fn newest_first(mut ids: Vec<u32>, limit: usize) -> Vec<u32> {
    ids.sort_unstable();
    ids.dedup();
    let start = ids.len().saturating_sub(limit);
    ids.split_off(start).into_iter().rev().collect()
}

/// Parses a raw message into a summary.
///
/// Missing headers fall back to fixed defaults; a missing `To` falls back to
/// `mailbox_address`. Only trailing whitespace is stripped from the body
/// before the preview is cut.
pub fn summarize(id: u32, raw: &[u8], mailbox_address: &str) -> Result<InboundMessageSummary> {
    let parsed = mailparse::parse_mail(raw)
        .map_err(|e| MailError::Protocol(format!("message {} could not be parsed: {}", id, e)))?;

    let header = |name: &str, default: &str| {
        parsed
            .headers
            .get_first_value(name)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    };

    Ok(InboundMessageSummary {
        id: id.to_string(),
        subject: header("Subject", InboundMessageSummary::NO_SUBJECT),
        from: header("From", InboundMessageSummary::UNKNOWN_SENDER),
        to: header("To", mailbox_address),
        date: header("Date", InboundMessageSummary::UNKNOWN_DATE),
        preview: preview(extract_body(&parsed).trim_end()),
    })
}

/// Multipart: first `text/plain` part in depth-first order, or empty.
/// Otherwise: the single payload, whatever its type.
fn extract_body(parsed: &ParsedMail) -> String {
    if parsed.ctype.mimetype.starts_with("multipart/") {
        first_plain_part(parsed).map(decode).unwrap_or_default()
    } else {
        decode(parsed)
    }
}

fn first_plain_part<'a, 'b>(part: &'a ParsedMail<'b>) -> Option<&'a ParsedMail<'b>> {
    if part.ctype.mimetype.eq_ignore_ascii_case("text/plain") {
        return Some(part);
    }
    part.subparts.iter().find_map(first_plain_part)
}

/// Decodes a part using its charset, falling back to lossy UTF-8.
fn decode(part: &ParsedMail) -> String {
    part.get_body().unwrap_or_else(|_| {
        part.get_body_raw()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, CustomServers};
    use crate::providers::email::{MockImapBackend, MockMailboxSession};
    use pretty_assertions::assert_eq;

    fn gmail() -> ProviderProfile {
        resolve("gmail", &CustomServers::default()).profile
    }

    fn creds() -> Credentials {
        Credentials::new("me@example.com", "app-password")
    }

    fn raw_message(id: u32) -> Vec<u8> {
        format!(
            "From: sender{id}@example.com\r\n\
             To: me@example.com\r\n\
             Subject: Message {id}\r\n\
             Date: Mon, 1 Jan 2024 10:00:0{d} +0000\r\n\
             \r\n\
             Body of message {id}\r\n",
            d = id % 10
        )
        .into_bytes()
    }

    fn reader_with(session: MockMailboxSession, policy: FetchPolicy) -> MailReader {
        let mut backend = MockImapBackend::new();
        backend
            .expect_open()
            .withf(|endpoint, _| endpoint.to_string() == "imap.gmail.com:993")
            .times(1)
            .return_once(move |_, _| Ok(Box::new(session) as Box<dyn MailboxSession>));
        MailReader::new(creds(), Arc::new(backend), policy)
    }

    #[test]
    fn newest_first_takes_tail_in_reverse() {
        assert_eq!(newest_first(vec![1, 2, 3, 4, 5], 3), vec![5, 4, 3]);
        assert_eq!(newest_first(vec![4, 1, 5, 3, 2], 3), vec![5, 4, 3]);
        assert_eq!(newest_first(vec![1, 2], 5), vec![2, 1]);
        assert_eq!(newest_first(vec![], 5), Vec::<u32>::new());
        assert_eq!(newest_first(vec![7, 7, 8], 2), vec![8, 7]);
    }

    #[test]
    fn summarize_reads_headers_and_body() {
        let summary = summarize(9, &raw_message(9), "me@example.com").unwrap();
        assert_eq!(summary.id, "9");
        assert_eq!(summary.subject, "Message 9");
        assert_eq!(summary.from, "sender9@example.com");
        assert_eq!(summary.to, "me@example.com");
        assert_eq!(summary.date, "Mon, 1 Jan 2024 10:00:09 +0000");
        assert_eq!(summary.preview, "Body of message 9");
    }

    #[test]
    fn summarize_applies_defaults() {
        let raw = b"X-Mailer: test\r\n\r\nhello\r\n";
        let summary = summarize(1, raw, "me@example.com").unwrap();
        assert_eq!(summary.subject, "No Subject");
        assert_eq!(summary.from, "Unknown Sender");
        assert_eq!(summary.date, "Unknown Date");
        assert_eq!(summary.to, "me@example.com");
        assert_eq!(summary.preview, "hello");
    }

    #[test]
    fn multipart_uses_first_plain_part() {
        let raw = b"Subject: Mixed\r\n\
Content-Type: multipart/alternative; boundary=\"XX\"\r\n\
\r\n\
--XX\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>html version</p>\r\n\
--XX\r\n\
Content-Type: text/plain\r\n\
\r\n\
first plain\r\n\
--XX\r\n\
Content-Type: text/plain\r\n\
\r\n\
second plain\r\n\
--XX--\r\n";

        let summary = summarize(1, raw, "me@example.com").unwrap();
        assert_eq!(summary.preview, "first plain");
    }

    #[test]
    fn multipart_without_plain_part_is_empty() {
        let raw = b"Content-Type: multipart/mixed; boundary=\"B\"\r\n\
\r\n\
--B\r\n\
Content-Type: text/html\r\n\
\r\n\
<b>only html</b>\r\n\
--B--\r\n";

        let summary = summarize(1, raw, "me@example.com").unwrap();
        assert_eq!(summary.preview, "");
    }

    #[test]
    fn single_part_html_is_used_as_is() {
        let raw = b"Content-Type: text/html\r\n\r\n<p>hi</p>\r\n";
        let summary = summarize(1, raw, "me@example.com").unwrap();
        assert_eq!(summary.preview, "<p>hi</p>");
    }

    #[test]
    fn undecodable_bytes_are_replaced() {
        let mut raw = b"Content-Type: text/plain; charset=utf-8\r\n\r\nbad ".to_vec();
        raw.extend_from_slice(&[0xff, 0xfe]);
        raw.extend_from_slice(b" bytes\r\n");

        let summary = summarize(1, &raw, "me@example.com").unwrap();
        assert!(summary.preview.starts_with("bad "));
        assert!(summary.preview.contains('\u{FFFD}'));
        assert!(summary.preview.ends_with("bytes"));
    }

    #[test]
    fn leading_whitespace_is_kept_in_preview() {
        let raw = format!("Subject: Indented\r\n\r\n    {}\r\n", "y".repeat(210));
        let summary = summarize(1, raw.as_bytes(), "me@example.com").unwrap();

        let expected = format!("    {}", "y".repeat(196));
        assert_eq!(summary.preview, format!("{}...", expected));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let raw = format!("Subject: Long\r\n\r\n{}\r\n", "x".repeat(250));
        let summary = summarize(1, raw.as_bytes(), "me@example.com").unwrap();
        assert_eq!(summary.preview, format!("{}...", "x".repeat(200)));
    }

    #[tokio::test]
    async fn read_returns_newest_first() {
        let mut session = MockMailboxSession::new();
        session
            .expect_select()
            .withf(|folder| folder == "INBOX")
            .times(1)
            .returning(|_| Ok(()));
        session
            .expect_search()
            .withf(|criterion| *criterion == SearchCriterion::All)
            .times(1)
            .returning(|_| Ok(vec![1, 2, 3, 4, 5]));
        session
            .expect_fetch()
            .times(3)
            .returning(|id| Ok(raw_message(id)));
        session.expect_logout().times(1).returning(|| Ok(()));

        let reader = reader_with(session, FetchPolicy::Lenient);
        let outcome = reader
            .read(&ReadRequest::new("INBOX", 3, false), &gmail())
            .await
            .unwrap();

        let ids: Vec<&str> = outcome.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["5", "4", "3"]);
        assert_eq!(outcome.count(), 3);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.messages[0].subject, "Message 5");
    }

    #[tokio::test]
    async fn unread_only_searches_unseen() {
        let mut session = MockMailboxSession::new();
        session.expect_select().returning(|_| Ok(()));
        session
            .expect_search()
            .withf(|criterion| *criterion == SearchCriterion::Unseen)
            .times(1)
            .returning(|_| Ok(vec![]));
        session.expect_fetch().never();
        session.expect_logout().times(1).returning(|| Ok(()));

        let reader = reader_with(session, FetchPolicy::Lenient);
        let outcome = reader
            .read(&ReadRequest::new("INBOX", 5, true), &gmail())
            .await
            .unwrap();
        assert_eq!(outcome.count(), 0);
    }

    #[tokio::test]
    async fn lenient_policy_skips_failed_fetch() {
        let mut session = MockMailboxSession::new();
        session.expect_select().returning(|_| Ok(()));
        session.expect_search().returning(|_| Ok(vec![1, 2, 3, 4, 5]));
        session.expect_fetch().times(3).returning(|id| {
            if id == 4 {
                Err(MailError::Protocol("FETCH failed".to_string()))
            } else {
                Ok(raw_message(id))
            }
        });
        session.expect_logout().times(1).returning(|| Ok(()));

        let reader = reader_with(session, FetchPolicy::Lenient);
        let outcome = reader
            .read(&ReadRequest::new("INBOX", 3, false), &gmail())
            .await
            .unwrap();

        let ids: Vec<&str> = outcome.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["5", "3"]);
        assert_eq!(outcome.skipped, 1);
    }

    #[tokio::test]
    async fn strict_policy_fails_fast_and_still_logs_out() {
        let mut session = MockMailboxSession::new();
        session.expect_select().returning(|_| Ok(()));
        session.expect_search().returning(|_| Ok(vec![1, 2, 3]));
        session.expect_fetch().times(1).returning(|_| {
            Err(MailError::Protocol("FETCH failed".to_string()))
        });
        session.expect_logout().times(1).returning(|| Ok(()));

        let reader = reader_with(session, FetchPolicy::Strict);
        let err = reader
            .read(&ReadRequest::new("INBOX", 3, false), &gmail())
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::Protocol(_)));
    }

    #[tokio::test]
    async fn search_failure_is_reported_and_session_closed() {
        let mut session = MockMailboxSession::new();
        session.expect_select().returning(|_| Ok(()));
        session
            .expect_search()
            .returning(|_| Err(MailError::Protocol("failed to search emails".to_string())));
        session.expect_fetch().never();
        session.expect_logout().times(1).returning(|| Ok(()));

        let reader = reader_with(session, FetchPolicy::Lenient);
        let err = reader
            .read(&ReadRequest::new("INBOX", 5, false), &gmail())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to search emails"));
    }

    #[tokio::test]
    async fn logout_failure_does_not_hide_result() {
        let mut session = MockMailboxSession::new();
        session.expect_select().returning(|_| Ok(()));
        session.expect_search().returning(|_| Ok(vec![1]));
        session.expect_fetch().returning(|id| Ok(raw_message(id)));
        session
            .expect_logout()
            .times(1)
            .returning(|| Err(MailError::Connection("connection reset".to_string())));

        let reader = reader_with(session, FetchPolicy::Lenient);
        let outcome = reader
            .read(&ReadRequest::new("INBOX", 5, false), &gmail())
            .await
            .unwrap();
        assert_eq!(outcome.count(), 1);
    }

    #[tokio::test]
    async fn missing_credentials_skip_network() {
        let backend = MockImapBackend::new();
        let reader = MailReader::new(
            Credentials::new("me@example.com", ""),
            Arc::new(backend),
            FetchPolicy::Lenient,
        );

        let err = reader
            .read(&ReadRequest::new("INBOX", 5, false), &gmail())
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::NotConfigured));
    }

    #[tokio::test]
    async fn login_rejection_is_authentication_error() {
        let mut backend = MockImapBackend::new();
        backend
            .expect_open()
            .times(1)
            .returning(|_, _| Err(MailError::Authentication("LOGIN rejected".to_string())));
        let reader = MailReader::new(creds(), Arc::new(backend), FetchPolicy::Lenient);

        let err = reader
            .read(&ReadRequest::new("INBOX", 5, false), &gmail())
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::Authentication(_)));
    }
}
