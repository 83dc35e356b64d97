//! AT URI type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Did, Nsid};
use crate::error::{Error, InvalidInputError};

/// A validated AT Protocol record URI: `at://<did>/<collection>/<rkey>`.
///
/// # Example
///
/// ```
/// use tern_core::AtUri;
///
/// let uri = AtUri::new("at://did:plc:z72i7hdynmk6r22z27h6tvur/app.bsky.feed.post/3jui7kd54zh2y").unwrap();
/// assert_eq!(uri.collection().as_str(), "app.bsky.feed.post");
/// assert_eq!(uri.rkey(), "3jui7kd54zh2y");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AtUri {
    repo: Did,
    collection: Nsid,
    rkey: String,
}

impl AtUri {
    /// Parse an AT URI, validating every component.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let invalid = |reason: String| InvalidInputError::AtUri {
            value: s.to_string(),
            reason,
        };

        let rest = s
            .strip_prefix("at://")
            .ok_or_else(|| invalid("must start with 'at://'".to_string()))?;

        let mut parts = rest.splitn(3, '/');
        let (Some(repo), Some(collection), Some(rkey)) = (parts.next(), parts.next(), parts.next())
        else {
            let reason = "must have format 'at://<repo>/<collection>/<rkey>'".to_string();
            return Err(invalid(reason).into());
        };

        let repo = Did::new(repo).map_err(|_| invalid(format!("invalid DID: {}", repo)))?;
        let collection =
            Nsid::new(collection).map_err(|_| invalid(format!("invalid NSID: {}", collection)))?;
        if !is_valid_rkey(rkey) {
            return Err(invalid(format!("invalid rkey: {}", rkey)).into());
        }

        Ok(Self {
            repo,
            collection,
            rkey: rkey.to_string(),
        })
    }

    /// Build an AT URI from components. The record key must be valid.
    pub fn from_parts(repo: Did, collection: Nsid, rkey: impl Into<String>) -> Result<Self, Error> {
        let rkey = rkey.into();
        if !is_valid_rkey(&rkey) {
            return Err(InvalidInputError::AtUri {
                value: format!("at://{}/{}/{}", repo, collection, rkey),
                reason: format!("invalid rkey: {}", rkey),
            }
            .into());
        }
        Ok(Self {
            repo,
            collection,
            rkey,
        })
    }

    /// Returns the repository (DID).
    pub fn repo(&self) -> &Did {
        &self.repo
    }

    /// Returns the collection (NSID).
    pub fn collection(&self) -> &Nsid {
        &self.collection
    }

    /// Returns the record key.
    pub fn rkey(&self) -> &str {
        &self.rkey
    }
}

/// Record keys: 1-512 characters of `[A-Za-z0-9._~:-]`, never `.` or `..`.
pub fn is_valid_rkey(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 512
        && s != "."
        && s != ".."
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '~' | ':'))
}

impl fmt::Display for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at://{}/{}/{}", self.repo, self.collection, self.rkey)
    }
}

impl FromStr for AtUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for AtUri {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AtUri {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        AtUri::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_components() {
        let uri = AtUri::new("at://did:plc:abc/app.bsky.feed.post/3jui7kd54zh2y").unwrap();
        assert_eq!(uri.repo().as_str(), "did:plc:abc");
        assert_eq!(uri.collection().as_str(), "app.bsky.feed.post");
        assert_eq!(uri.rkey(), "3jui7kd54zh2y");
        assert_eq!(uri.to_string(), "at://did:plc:abc/app.bsky.feed.post/3jui7kd54zh2y");
    }

    #[test]
    fn rejects_partial_uris() {
        assert!(AtUri::new("did:plc:abc/app.bsky.feed.post/rkey").is_err());
        assert!(AtUri::new("at://did:plc:abc/app.bsky.feed.post").is_err());
        assert!(AtUri::new("at://did:plc:abc/app.bsky.feed.post/..").is_err());
    }

    #[test]
    fn self_rkey_is_valid() {
        let did = Did::new("did:plc:abc").unwrap();
        let nsid = Nsid::new("app.bsky.actor.profile").unwrap();
        let uri = AtUri::from_parts(did, nsid, "self").unwrap();
        assert_eq!(uri.to_string(), "at://did:plc:abc/app.bsky.actor.profile/self");
    }
}
