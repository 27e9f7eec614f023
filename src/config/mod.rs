//! Configuration: settings, credentials and the provider table.
//!
//! Settings are built once at process start and handed to each component;
//! nothing below this module reads the environment directly.

mod credentials;
mod providers;
mod settings;

pub use credentials::Credentials;
pub use providers::{resolve, Endpoint, ProviderKind, ProviderProfile, Resolution};
pub use settings::{
    CustomServers, FetchPolicy, ReadSettings, Settings, SettingsError, DEFAULT_IMAP_PORT,
    DEFAULT_SMTP_PORT,
};
