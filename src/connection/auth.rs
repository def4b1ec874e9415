//! Authentication handling for Spark connections.
//!
//! This module provides secure token storage and the header used to
//! authenticate HTTP tunnel sessions.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::sync::Arc;

/// Name of the header carrying the token on HTTP tunnel sessions.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Secure token container.
///
/// The token is never displayed by `Debug` or `Display`, and its bytes are
/// zeroed when the last clone is dropped.
#[derive(Clone)]
pub struct SecretToken {
    inner: Arc<SecureBytes>,
}

impl SecretToken {
    /// Wrap a token.
    pub fn new(token: String) -> Self {
        Self {
            inner: Arc::new(SecureBytes {
                data: token.into_bytes(),
            }),
        }
    }

    /// Get the token text (for building auth headers only, never log it).
    pub fn expose(&self) -> &str {
        std::str::from_utf8(&self.inner.data).unwrap_or_default()
    }
}

impl From<String> for SecretToken {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretToken(<redacted>)")
    }
}

impl fmt::Display for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted>")
    }
}

struct SecureBytes {
    data: Vec<u8>,
}

impl Drop for SecureBytes {
    fn drop(&mut self) {
        for byte in &mut self.data {
            *byte = 0;
        }
    }
}

/// Build the `Authorization` header value for a token.
///
/// The tunnel expects HTTP basic auth with the literal user `token` and the
/// token as password: `Basic base64("token:" + token)`.
pub fn basic_token_auth(token: &SecretToken) -> String {
    let raw = format!("token:{}", token.expose());
    format!("Basic {}", STANDARD.encode(raw.as_bytes()))
}
