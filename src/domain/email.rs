//! Email domain types.
//!
//! Outbound messages are built per send call and inbound summaries per read
//! call; neither is persisted.

use serde::{Deserialize, Serialize};

/// Maximum number of characters kept in a body preview.
pub const PREVIEW_CHARS: usize = 200;

/// Marker appended to a preview that was cut short.
pub const ELLIPSIS: &str = "...";

/// Content type of an outbound body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    /// `text/plain`.
    #[default]
    Plain,
    /// `text/html`.
    Html,
}

/// An email to be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Primary recipient.
    pub to: String,
    /// Comma-separated CC recipients.
    pub cc: Option<String>,
    /// Comma-separated BCC recipients. Never written as a header.
    pub bcc: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Body text.
    pub body: String,
    /// Whether `body` is plain text or HTML.
    pub format: BodyFormat,
}

impl OutboundMessage {
    /// Creates a plain-text message to a single recipient.
    pub fn plain(
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            cc: None,
            bcc: None,
            subject: subject.into(),
            body: body.into(),
            format: BodyFormat::Plain,
        }
    }

    /// Sets the CC list. Blank lists are treated as absent.
    pub fn with_cc(mut self, cc: Option<impl Into<String>>) -> Self {
        self.cc = cc.map(Into::into).filter(|s| !s.trim().is_empty());
        self
    }

    /// Sets the BCC list. Blank lists are treated as absent.
    pub fn with_bcc(mut self, bcc: Option<impl Into<String>>) -> Self {
        self.bcc = bcc.map(Into::into).filter(|s| !s.trim().is_empty());
        self
    }

    /// Marks the body as HTML.
    pub fn html(mut self) -> Self {
        self.format = BodyFormat::Html;
        self
    }

    /// CC recipients split on commas.
    pub fn cc_list(&self) -> Vec<&str> {
        split_recipients(self.cc.as_deref())
    }

    /// BCC recipients split on commas.
    pub fn bcc_list(&self) -> Vec<&str> {
        split_recipients(self.bcc.as_deref())
    }
}

/// Splits a comma-separated recipient list, trimming and dropping empty entries.
pub fn split_recipients(list: Option<&str>) -> Vec<&str> {
    list.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Read-only projection of a fetched message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessageSummary {
    /// Server-assigned message number.
    pub id: String,
    /// Subject, or "No Subject".
    pub subject: String,
    /// Sender, or "Unknown Sender".
    pub from: String,
    /// Recipient header, or the mailbox address when absent.
    pub to: String,
    /// Raw Date header, or "Unknown Date".
    pub date: String,
    /// First [`PREVIEW_CHARS`] characters of the body.
    pub preview: String,
}

impl InboundMessageSummary {
    /// Default subject when the header is missing.
    pub const NO_SUBJECT: &'static str = "No Subject";
    /// Default sender when the header is missing.
    pub const UNKNOWN_SENDER: &'static str = "Unknown Sender";
    /// Default date when the header is missing.
    pub const UNKNOWN_DATE: &'static str = "Unknown Date";
}

/// Shortens `body` to [`PREVIEW_CHARS`] characters, appending [`ELLIPSIS`] if cut.
pub fn preview(body: &str) -> String {
    match body.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}{}", &body[..cut], ELLIPSIS),
        None => body.to_string(),
    }
}
