//! Token types for authenticated sessions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum remaining lifetime, in seconds, for an access token to be used
/// without refreshing.
pub const MIN_TOKEN_LIFETIME_SECS: i64 = 60;

/// An access token for authenticated XRPC requests.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque outside of expiry inspection
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in authorization headers.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// A refresh token for obtaining new access tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Create a new refresh token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in refresh requests.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}

/// The token pair held by a session, with the access token's expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: AccessToken,
    #[serde(default)]
    pub refresh_token: Option<RefreshToken>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenSet {
    /// Returns true when the access token can be used at `now`: it either has
    /// no known expiry or stays valid for at least [`MIN_TOKEN_LIFETIME_SECS`].
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| {
            expires_at - now >= Duration::seconds(MIN_TOKEN_LIFETIME_SECS)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(expires_at: Option<DateTime<Utc>>) -> TokenSet {
        TokenSet {
            access_token: AccessToken::new("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9..."),
            refresh_token: Some(RefreshToken::new("refresh_token_value_here")),
            expires_at,
        }
    }

    #[test]
    fn token_set_hides_values_in_debug() {
        let debug = format!("{:?}", tokens(None));
        assert!(!debug.contains("eyJ"));
        assert!(!debug.contains("refresh_token_value"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn usability_requires_a_minute_of_lifetime() {
        let now = Utc::now();
        assert!(tokens(None).is_usable(now));
        assert!(tokens(Some(now + Duration::seconds(60))).is_usable(now));
        assert!(tokens(Some(now + Duration::hours(1))).is_usable(now));
        assert!(!tokens(Some(now + Duration::seconds(59))).is_usable(now));
        assert!(!tokens(Some(now - Duration::seconds(1))).is_usable(now));
    }
}
