//! Domain types for the mail tools.
//!
//! Messages going out, summaries coming in, and the success payloads each
//! operation returns.

mod email;
mod outcome;

pub use email::{
    preview, split_recipients, BodyFormat, InboundMessageSummary, OutboundMessage, ELLIPSIS,
    PREVIEW_CHARS,
};
pub use outcome::{ConnectionReport, ReadOutcome, SendReceipt};
