//! Decentralized Identifier (DID) type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated Decentralized Identifier (DID).
///
/// Follows the AT Protocol DID syntax: `did:<method>:<method-specific-id>`,
/// where the method is lowercase ASCII letters and the identifier uses
/// `[A-Za-z0-9._:%-]` and does not end in `:` or `%`.
///
/// # Example
///
/// ```
/// use tern_core::Did;
///
/// let did = Did::new("did:plc:z72i7hdynmk6r22z27h6tvur").unwrap();
/// assert_eq!(did.method(), "plc");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Create a new DID from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid DID format.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        if let Some(reason) = Self::invalid_reason(&s) {
            return Err(InvalidInputError::Did {
                value: s,
                reason: reason.to_string(),
            }
            .into());
        }
        Ok(Self(s))
    }

    /// Returns true when `s` matches the DID syntax.
    pub fn is_valid(s: &str) -> bool {
        Self::invalid_reason(s).is_none()
    }

    /// Returns the DID method (e.g., "plc" for "did:plc:...").
    pub fn method(&self) -> &str {
        self.parts().0
    }

    /// Returns the method-specific identifier.
    pub fn identifier(&self) -> &str {
        self.parts().1
    }

    /// Returns the full DID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parts(&self) -> (&str, &str) {
        self.0
            .strip_prefix("did:")
            .and_then(|rest| rest.split_once(':'))
            .unwrap_or(("", ""))
    }

    fn invalid_reason(s: &str) -> Option<&'static str> {
        let Some(rest) = s.strip_prefix("did:") else {
            return Some("must start with 'did:'");
        };
        let Some((method, identifier)) = rest.split_once(':') else {
            return Some("must have format 'did:<method>:<identifier>'");
        };

        if method.is_empty() || !method.chars().all(|c| c.is_ascii_lowercase()) {
            return Some("method must be non-empty lowercase letters");
        }
        if identifier.is_empty() {
            return Some("identifier must be non-empty");
        }
        if !identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '%' | '-'))
        {
            return Some("identifier contains invalid characters");
        }
        if identifier.ends_with(':') || identifier.ends_with('%') {
            return Some("identifier must not end with ':' or '%'");
        }
        if s.len() > 2048 {
            return Some("exceeds maximum length of 2048 characters");
        }
        None
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Did {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
