//! PDS URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated PDS (Personal Data Server) URL, the hosting endpoint of an
/// identity.
///
/// The URL must be absolute, use `http` or `https`, and have a non-empty host.
///
/// # Example
///
/// ```
/// use tern_core::PdsUrl;
///
/// let pds = PdsUrl::new("https://bsky.social").unwrap();
/// assert_eq!(pds.xrpc_url("com.atproto.server.createSession"),
///            "https://bsky.social/xrpc/com.atproto.server.createSession");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PdsUrl(Url);

impl PdsUrl {
    /// Create a new PDS URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::PdsUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        if let Some(reason) = Self::invalid_reason(&url) {
            return Err(InvalidInputError::PdsUrl {
                value: s.to_string(),
                reason: reason.to_string(),
            }
            .into());
        }

        Ok(Self(url))
    }

    /// Returns true when `s` parses as an absolute http(s) URL with a host.
    pub fn is_valid(s: &str) -> bool {
        Url::parse(s).is_ok_and(|url| Self::invalid_reason(&url).is_none())
    }

    /// Returns the XRPC endpoint URL for a given method.
    pub fn xrpc_url(&self, method: &str) -> String {
        self.join(&format!("xrpc/{}", method))
    }

    /// Returns `path` resolved against the origin of this PDS.
    pub fn join(&self, path: &str) -> String {
        let base = self.0.as_str().trim_end_matches('/');
        format!("{}/{}", base, path.trim_start_matches('/'))
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    fn invalid_reason(url: &Url) -> Option<&'static str> {
        if url.cannot_be_a_base() {
            return Some("must be an absolute URL");
        }
        if url.scheme() != "https" && url.scheme() != "http" {
            return Some("must use http or https");
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Some("must have a host");
        }
        None
    }
}

impl fmt::Display for PdsUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PdsUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for PdsUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for PdsUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PdsUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for PdsUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_url() {
        let pds = PdsUrl::new("https://bsky.social").unwrap();
        assert_eq!(pds.host(), Some("bsky.social"));
    }

    #[test]
    fn plain_http_is_accepted() {
        assert!(PdsUrl::new("http://127.0.0.1:2583").is_ok());
        assert!(PdsUrl::is_valid("http://pds.internal"));
    }

    #[test]
    fn normalizes_trailing_slash_in_xrpc_url() {
        let pds = PdsUrl::new("https://bsky.social/").unwrap();
        assert_eq!(
            pds.xrpc_url("com.atproto.server.createSession"),
            "https://bsky.social/xrpc/com.atproto.server.createSession"
        );
        assert_eq!(
            pds.join("/.well-known/oauth-protected-resource"),
            "https://bsky.social/.well-known/oauth-protected-resource"
        );
    }

    #[test]
    fn rejects_other_schemes_and_relative_urls() {
        assert!(PdsUrl::new("ftp://x.com").is_err());
        assert!(PdsUrl::new("file:///tmp/pds").is_err());
        assert!(PdsUrl::new("/xrpc/method").is_err());
        assert!(!PdsUrl::is_valid("mailto:alice@example.com"));
    }
}
