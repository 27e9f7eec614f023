//! Mail services.
//!
//! Each service runs one fixed protocol sequence per call
//! (connect, authenticate, operate, disconnect) and returns a typed result:
//!
//! - [`MailSender`] - compose and transmit a message over SMTP
//! - [`MailReader`] - search and fetch recent messages over IMAP
//! - [`ConnectionTester`] - log in to both servers without touching mail
//!
//! Services never read the environment. Credentials and backends are passed
//! in at construction so tests can inject fakes.

mod reader;
mod sender;
mod tester;

pub use reader::{newest_first, summarize, MailReader, ReadRequest};
pub use sender::MailSender;
pub use tester::ConnectionTester;
