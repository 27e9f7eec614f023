//! mailtools - SMTP and IMAP tools for agent frameworks
//!
//! This crate provides four email operations (send, read recent, test
//! connection, quick notification) that return human-readable replies,
//! together with the provider configuration and protocol plumbing behind them.

pub mod config;
pub mod domain;
pub mod providers;
pub mod services;
pub mod tools;

pub use config::Settings;
pub use tools::MailTools;
