//! Handle type and domain-name syntax.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated AT Protocol handle, e.g. `alice.bsky.social`.
///
/// Handles are mutable aliases for a DID, so a resolved handle is only a
/// point-in-time fact.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    /// Create a new handle, validating the syntax.
    ///
    /// A leading `@` is stripped.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        let s = match s.strip_prefix('@') {
            Some(stripped) => stripped.to_string(),
            None => s,
        };
        if let Some(reason) = Self::invalid_reason(&s) {
            return Err(InvalidInputError::Handle {
                value: s,
                reason: reason.to_string(),
            }
            .into());
        }
        Ok(Self(s))
    }

    /// Returns the handle string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn invalid_reason(s: &str) -> Option<&'static str> {
        if s.len() > 253 {
            return Some("exceeds maximum length of 253 characters");
        }
        let labels: Vec<&str> = s.split('.').collect();
        if labels.len() < 2 {
            return Some("must contain at least two labels");
        }
        for label in &labels {
            if label.is_empty() || label.len() > 63 {
                return Some("labels must be 1-63 characters");
            }
            if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Some("labels may only contain letters, digits and hyphens");
            }
            if label.starts_with('-') || label.ends_with('-') {
                return Some("labels must not start or end with a hyphen");
            }
        }
        if labels
            .last()
            .and_then(|l| l.chars().next())
            .is_some_and(|c| c.is_ascii_digit())
        {
            return Some("top-level label must not start with a digit");
        }
        None
    }
}

/// Returns true when `s` is a plain domain name: alphanumeric/hyphen labels
/// joined by dots, ending in an alphabetic label of at least two letters.
///
/// This is the syntax accepted for `did:web` identifiers.
pub fn is_domain_name(s: &str) -> bool {
    let Some((head, tld)) = s.rsplit_once('.') else {
        return false;
    };
    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    head.split('.').all(|label| {
        !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Handle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Handle {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
