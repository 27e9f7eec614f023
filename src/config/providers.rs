//! Known mail providers and their SMTP/IMAP endpoints.
//!
//! Resolution is a pure lookup over a static table. Names that are not in the
//! table resolve to Gmail; the [`Resolution`] records when that happened so
//! callers can surface it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::settings::CustomServers;

/// A named mail provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Mail.
    Gmail,
    /// Microsoft Outlook / Office 365.
    Outlook,
    /// Yahoo Mail.
    Yahoo,
    /// Servers taken from `SMTP_SERVER` / `IMAP_SERVER`.
    Custom,
}

impl ProviderKind {
    /// Provider used when a name is not recognised.
    pub const FALLBACK: ProviderKind = ProviderKind::Gmail;

    /// Parses a provider name, ignoring case and surrounding whitespace.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gmail" => Some(Self::Gmail),
            "outlook" => Some(Self::Outlook),
            "yahoo" => Some(Self::Yahoo),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    /// Lowercase provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Outlook => "outlook",
            Self::Yahoo => "yahoo",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server host and port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Server hostname. Empty when a custom server was never configured.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Endpoint {
    /// Creates an endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns true when a host is set.
    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// SMTP and IMAP endpoints for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Which provider this profile describes.
    pub kind: ProviderKind,
    /// Outbound submission server (STARTTLS).
    pub smtp: Endpoint,
    /// Mailbox server (implicit TLS).
    pub imap: Endpoint,
}

impl ProviderProfile {
    /// Builds the profile for `kind`. Only `Custom` consults `custom`.
    pub fn for_kind(kind: ProviderKind, custom: &CustomServers) -> Self {
        let (smtp, imap) = match kind {
            ProviderKind::Gmail => (
                Endpoint::new("smtp.gmail.com", 587),
                Endpoint::new("imap.gmail.com", 993),
            ),
            ProviderKind::Outlook => (
                Endpoint::new("smtp-mail.outlook.com", 587),
                Endpoint::new("outlook.office365.com", 993),
            ),
            ProviderKind::Yahoo => (
                Endpoint::new("smtp.mail.yahoo.com", 587),
                Endpoint::new("imap.mail.yahoo.com", 993),
            ),
            ProviderKind::Custom => (
                Endpoint::new(
                    custom.smtp_server.clone().unwrap_or_default(),
                    custom.smtp_port,
                ),
                Endpoint::new(
                    custom.imap_server.clone().unwrap_or_default(),
                    custom.imap_port,
                ),
            ),
        };

        Self { kind, smtp, imap }
    }
}

/// Outcome of resolving a provider name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The resolved profile.
    pub profile: ProviderProfile,
    /// True when the requested name was unknown and the fallback was used.
    pub used_fallback: bool,
}

/// Resolves a provider name to its profile, falling back to Gmail for unknown names.
pub fn resolve(name: &str, custom: &CustomServers) -> Resolution {
    match ProviderKind::parse(name) {
        Some(kind) => Resolution {
            profile: ProviderProfile::for_kind(kind, custom),
            used_fallback: false,
        },
        None => {
            tracing::warn!(
                requested = name,
                fallback = %ProviderKind::FALLBACK,
                "unknown mail provider, using fallback"
            );
            Resolution {
                profile: ProviderProfile::for_kind(ProviderKind::FALLBACK, custom),
                used_fallback: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_providers_resolve() {
        let custom = CustomServers::default();

        let gmail = resolve("gmail", &custom);
        assert!(!gmail.used_fallback);
        assert_eq!(gmail.profile.smtp.to_string(), "smtp.gmail.com:587");
        assert_eq!(gmail.profile.imap.to_string(), "imap.gmail.com:993");

        let outlook = resolve("Outlook", &custom);
        assert_eq!(outlook.profile.kind, ProviderKind::Outlook);
        assert_eq!(outlook.profile.smtp.host, "smtp-mail.outlook.com");
        assert_eq!(outlook.profile.imap.host, "outlook.office365.com");

        let yahoo = resolve(" yahoo ", &custom);
        assert_eq!(yahoo.profile.smtp.host, "smtp.mail.yahoo.com");
        assert_eq!(yahoo.profile.imap.host, "imap.mail.yahoo.com");
    }

    #[test]
    fn unknown_names_fall_back_to_gmail() {
        let custom = CustomServers::default();
        let gmail = resolve("gmail", &custom).profile;

        for name in ["", "hotmail", "protonmail", "gmail2", "🦀"] {
            let resolution = resolve(name, &custom);
            assert!(resolution.used_fallback, "{name:?} should fall back");
            assert_eq!(resolution.profile, gmail);
            assert_eq!(resolve(name, &custom), resolution);
        }
    }

    #[test]
    fn custom_uses_configured_servers() {
        let custom = CustomServers {
            smtp_server: Some("mail.example.org".to_string()),
            smtp_port: 2525,
            imap_server: Some("imap.example.org".to_string()),
            imap_port: 1993,
        };

        let profile = resolve("custom", &custom).profile;
        assert_eq!(profile.kind, ProviderKind::Custom);
        assert_eq!(profile.smtp, Endpoint::new("mail.example.org", 2525));
        assert_eq!(profile.imap, Endpoint::new("imap.example.org", 1993));
    }

    #[test]
    fn custom_without_servers_is_unconfigured() {
        let profile = resolve("custom", &CustomServers::default()).profile;
        assert!(!profile.smtp.is_configured());
        assert!(!profile.imap.is_configured());
        assert_eq!(profile.smtp.port, 587);
        assert_eq!(profile.imap.port, 993);
    }

    #[test]
    fn named_providers_ignore_custom_servers() {
        let custom = CustomServers {
            smtp_server: Some("mail.example.org".to_string()),
            ..CustomServers::default()
        };
        let profile = resolve("gmail", &custom).profile;
        assert_eq!(profile.smtp.host, "smtp.gmail.com");
    }

    #[test]
    fn provider_kind_serialization() {
        let json = serde_json::to_string(&ProviderKind::Outlook).unwrap();
        assert_eq!(json, "\"outlook\"");
        assert_eq!(ProviderKind::Custom.to_string(), "custom");
    }
}
