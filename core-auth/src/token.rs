//! Session token generation.
//!
//! Tokens are 32 bytes from the thread-local CSPRNG, encoded URL-safe base64
//! without padding (43 characters). Nothing about a token is derived from the
//! clock or from the identity it belongs to.
//!
//! `SessionToken` deliberately has no `Display` impl and a redacted `Debug`
//! impl so a token cannot end up in a log line by accident. Use
//! [`SessionToken::fingerprint`] to correlate log entries with a session.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::borrow::Borrow;
use std::fmt;

/// Random bytes per token (256 bits)
pub const TOKEN_BYTES: usize = 32;

/// Length of an encoded token
pub const TOKEN_LENGTH: usize = 43;

/// Hex characters of the SHA-256 digest used as a log fingerprint
const FINGERPRINT_LEN: usize = 8;

/// Generate a fresh token string.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Opaque session token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Draw a new random token.
    pub fn generate() -> Self {
        Self(generate_token())
    }

    /// Wrap a token presented by a client. No format check is made; unknown
    /// values simply fail lookup.
    pub fn from_client(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The token value, for handing back to the client.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Short, non-reversible identifier safe to log.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.0)
    }
}

/// First 8 hex characters of SHA-256 over `token`.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut out = String::with_capacity(FINGERPRINT_LEN);
    for byte in digest.iter().take(FINGERPRINT_LEN / 2) {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

impl Borrow<str> for SessionToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken")
            .field(&format_args!("[REDACTED {}]", self.fingerprint()))
            .finish()
    }
}
