//! Namespaced Identifier (NSID) type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated Namespaced Identifier, naming a record collection such as
/// `app.bsky.feed.post`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nsid(String);

impl Nsid {
    /// Create a new NSID from a string, validating the format.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        if let Some(reason) = Self::invalid_reason(&s) {
            return Err(InvalidInputError::Nsid { value: s, reason }.into());
        }
        Ok(Self(s))
    }

    /// Returns the full NSID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn invalid_reason(s: &str) -> Option<String> {
        if s.len() > 317 {
            return Some("exceeds maximum length of 317 characters".to_string());
        }
        let segments: Vec<&str> = s.split('.').collect();
        if segments.len() < 3 {
            return Some("must have at least 3 segments (e.g., 'app.bsky.feed')".to_string());
        }
        for segment in segments {
            if !segment.starts_with(|c: char| c.is_ascii_alphabetic()) {
                return Some(format!("segment '{}' must start with a letter", segment));
            }
            if !segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Some(format!("segment '{}' contains invalid characters", segment));
            }
        }
        None
    }
}

impl fmt::Display for Nsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Nsid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Nsid {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Nsid> for String {
    fn from(nsid: Nsid) -> Self {
        nsid.0
    }
}
