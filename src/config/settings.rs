//! Process-wide mail settings.
//!
//! Settings are assembled once at startup: optional non-secret defaults are read
//! from `~/.config/mailtools/settings.json` (or XDG equivalent) and the process
//! environment is layered on top. Secrets only ever come from the environment.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::credentials::Credentials;

/// Errors raised while assembling settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{var} must be a port number, got {value:?}")]
    InvalidPort { var: &'static str, value: String },

    #[error("EMAIL_FETCH_POLICY must be \"lenient\" or \"strict\", got {0:?}")]
    InvalidFetchPolicy(String),

    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Default SMTP submission port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;
/// Default IMAP port (implicit TLS).
pub const DEFAULT_IMAP_PORT: u16 = 993;

/// Top-level mail settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mailbox address used for login and as the sender.
    pub email_address: String,
    /// Password or app-specific password. Never written to disk.
    #[serde(skip)]
    pub email_password: String,
    /// Provider name resolved by [`resolve`](super::resolve).
    pub provider: String,
    /// Endpoints for the `custom` provider.
    pub custom: CustomServers,
    /// Mailbox reading preferences.
    pub read: ReadSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            email_address: String::new(),
            email_password: String::new(),
            provider: "gmail".to_string(),
            custom: CustomServers::default(),
            read: ReadSettings::default(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("email_address", &self.email_address)
            .field("email_password", &"<redacted>")
            .field("provider", &self.provider)
            .field("custom", &self.custom)
            .field("read", &self.read)
            .finish()
    }
}

/// SMTP/IMAP endpoints consulted only for the `custom` provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomServers {
    /// SMTP server hostname.
    pub smtp_server: Option<String>,
    /// SMTP server port.
    pub smtp_port: u16,
    /// IMAP server hostname.
    pub imap_server: Option<String>,
    /// IMAP server port.
    pub imap_port: u16,
}

impl Default for CustomServers {
    fn default() -> Self {
        Self {
            smtp_server: None,
            smtp_port: DEFAULT_SMTP_PORT,
            imap_server: None,
            imap_port: DEFAULT_IMAP_PORT,
        }
    }
}

/// Preferences for reading mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadSettings {
    /// Folder read by the recent-mail tool.
    pub folder: String,
    /// What to do when a single message in a batch cannot be fetched or parsed.
    pub fetch_policy: FetchPolicy,
}

impl Default for ReadSettings {
    fn default() -> Self {
        Self {
            folder: "INBOX".to_string(),
            fetch_policy: FetchPolicy::Lenient,
        }
    }
}

/// Handling of per-message failures during a batch fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchPolicy {
    /// Omit the failing message and keep going. The result may hold fewer
    /// messages than requested.
    #[default]
    Lenient,
    /// Abort the whole read on the first failing message.
    Strict,
}

impl std::str::FromStr for FetchPolicy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            _ => Err(SettingsError::InvalidFetchPolicy(s.to_string())),
        }
    }
}

impl Settings {
    /// Builds settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup, starting from defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().overlay(lookup)
    }

    /// Loads the settings file (if any) and overlays the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        let base = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        base.overlay(|key| std::env::var(key).ok())
    }

    /// Reads non-secret settings from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Location of the settings file in the user's config directory.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "mailtools")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Applies values from `lookup` on top of `self`. Empty values are ignored.
    pub fn overlay<F>(mut self, lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(address) = get("EMAIL_ADDRESS") {
            self.email_address = address.trim().to_string();
        }
        if let Some(password) = get("EMAIL_PASSWORD") {
            self.email_password = password;
        }
        if let Some(provider) = get("EMAIL_PROVIDER") {
            self.provider = provider.trim().to_string();
        }
        if let Some(server) = get("SMTP_SERVER") {
            self.custom.smtp_server = Some(server.trim().to_string());
        }
        if let Some(port) = get("SMTP_PORT") {
            self.custom.smtp_port = parse_port("SMTP_PORT", &port)?;
        }
        if let Some(server) = get("IMAP_SERVER") {
            self.custom.imap_server = Some(server.trim().to_string());
        }
        if let Some(port) = get("IMAP_PORT") {
            self.custom.imap_port = parse_port("IMAP_PORT", &port)?;
        }
        if let Some(policy) = get("EMAIL_FETCH_POLICY") {
            self.read.fetch_policy = policy.parse()?;
        }

        Ok(self)
    }

    /// Login credentials derived from these settings.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.email_address.clone(), self.email_password.clone())
    }

    /// True iff both the address and the secret are set.
    pub fn credentials_present(&self) -> bool {
        self.credentials().is_present()
    }
}

fn parse_port(var: &'static str, value: &str) -> Result<u16, SettingsError> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|_| SettingsError::InvalidPort {
            var,
            value: value.to_string(),
        })
}
