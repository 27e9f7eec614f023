//! Text rendering for tool replies.

use chrono::{DateTime, Local};

use crate::domain::{ConnectionReport, InboundMessageSummary, ReadOutcome, SendReceipt};
use crate::providers::email::MailError;

/// Timestamp format used in notification subjects and bodies.
pub const NOTIFICATION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reply for a delivered email, with the completion timestamp.
pub fn sent(receipt: &SendReceipt) -> String {
    format!(
        "✅ {}\n📧 Subject: {}\n⏰ Sent at: {}",
        receipt.summary(),
        receipt.subject,
        receipt.timestamp()
    )
}

/// Reply for a failed `send_email`.
pub fn send_failed(err: &MailError) -> String {
    format!("❌ Failed to send email: {}", err)
}

/// Numbered list of messages, or a "nothing found" line when empty.
pub fn inbox(outcome: &ReadOutcome, unread_only: bool) -> String {
    if outcome.messages.is_empty() {
        let filter = if unread_only { "unread " } else { "" };
        let mut reply = format!(
            "📭 No {}emails found in {}",
            filter,
            folder_label(&outcome.folder)
        );
        push_skipped(&mut reply, outcome.skipped);
        return reply;
    }

    let entries: Vec<String> = outcome
        .messages
        .iter()
        .enumerate()
        .map(|(i, message)| entry(i + 1, message))
        .collect();

    let filter = if unread_only { " (unread only)" } else { "" };
    let mut reply = format!("📬 Recent Emails{}:\n\n{}", filter, entries.join("\n"));
    push_skipped(&mut reply, outcome.skipped);
    reply
}

fn entry(position: usize, message: &InboundMessageSummary) -> String {
    format!(
        "{}. 📧 From: {}\n   📝 Subject: {}\n   📅 Date: {}\n   💬 Preview: {}\n",
        position, message.from, message.subject, message.date, message.preview
    )
}

fn folder_label(folder: &str) -> String {
    if folder.eq_ignore_ascii_case("INBOX") {
        "inbox".to_string()
    } else {
        folder.to_string()
    }
}

fn push_skipped(reply: &mut String, skipped: usize) {
    if skipped > 0 {
        reply.push_str(&format!(
            "\n⚠️ {} message(s) could not be loaded and were left out",
            skipped
        ));
    }
}

/// Reply for a failed `read_recent_emails`.
pub fn read_failed(err: &MailError) -> String {
    format!("❌ Failed to read emails: {}", err)
}

/// Reply naming the address, provider and both endpoints that answered.
pub fn connection(report: &ConnectionReport) -> String {
    format!(
        "✅ {}\n📧 Email: {}\n🌐 Provider: {}\n📤 SMTP: {}\n📥 IMAP: {}",
        report.summary(),
        report.address,
        report.provider,
        report.smtp_endpoint,
        report.imap_endpoint
    )
}

/// Reply for a failed connection test.
pub fn connection_failed(err: &MailError) -> String {
    format!("❌ Email Connection Failed: {}", err)
}

/// Subject line `Notification - YYYY-MM-DD HH:MM:SS`.
pub fn notification_subject(at: &DateTime<Local>) -> String {
    format!("Notification - {}", at.format(NOTIFICATION_TIME_FORMAT))
}

/// Plain-text notification body embedding the time and `message`.
pub fn notification_body(at: &DateTime<Local>, message: &str) -> String {
    format!(
        "🔔 Notification from mailtools\n\n📅 Time: {}\n💬 Message: {}\n\n---\nThis is an automated notification sent by mailtools.",
        at.format(NOTIFICATION_TIME_FORMAT),
        message
    )
}

/// Reply for a delivered notification.
pub fn notification_sent(recipient: &str, message: &str) -> String {
    format!(
        "🔔 Notification sent successfully to {}\n💬 Message: {}",
        recipient, message
    )
}

/// Reply for a failed notification.
pub fn notification_failed(err: &MailError) -> String {
    format!("❌ Failed to send notification: {}", err)
}
