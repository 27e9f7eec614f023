//! External service implementations.
//!
//! - [`email`] - SMTP and IMAP transports

pub mod email;
