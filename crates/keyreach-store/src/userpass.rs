//! Username/password credentials
//!
//! Stored as a plain `username:password` payload. The split happens on the
//! first `:`, so passwords may contain colons but usernames may not.

use keyreach_core::{KeyringError, Result};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Username/password pair
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct UserPass {
    username: String,
    password: String,
}

impl UserPass {
    /// Create a credential; the username must not contain `:`
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let username = username.into();
        if username.contains(':') {
            return Err(KeyringError::invalid("username must not contain ':'"));
        }
        Ok(Self {
            username,
            password: password.into(),
        })
    }

    /// The username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Storable form
    pub fn to_payload(&self) -> Zeroizing<Vec<u8>> {
        let mut payload = Vec::with_capacity(self.username.len() + 1 + self.password.len());
        payload.extend_from_slice(self.username.as_bytes());
        payload.push(b':');
        payload.extend_from_slice(self.password.as_bytes());
        Zeroizing::new(payload)
    }

    /// Parse a stored payload
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| KeyringError::invalid(format!("credential is not UTF-8: {e}")))?;
        let (username, password) = text
            .split_once(':')
            .ok_or_else(|| KeyringError::invalid("expected 'username:password'"))?;
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl fmt::Debug for UserPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPass")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
