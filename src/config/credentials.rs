//! Mailbox login credentials.

use std::fmt;

/// An email address and its password or app-specific password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name, also used as the sender address.
    pub address: String,
    /// Password or app-specific token.
    pub secret: String,
}

impl Credentials {
    /// Creates credentials from an address and secret.
    pub fn new(address: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            secret: secret.into(),
        }
    }

    /// Returns true when both the address and the secret are non-empty.
    pub fn is_present(&self) -> bool {
        !self.address.trim().is_empty() && !self.secret.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("address", &self.address)
            .field("secret", &"<redacted>")
            .finish()
    }
}
