//! Durable storage traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::tokens::TokenSet;
use crate::types::{Did, PdsUrl};

/// Synchronous string-keyed, string-valued durable storage.
///
/// Mirrors browser local storage: reads and writes complete before returning.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Returns true when `key` has a stored value.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// A session persisted by the OAuth session storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub did: Did,
    pub pds: PdsUrl,
    pub tokens: TokenSet,
}

/// Storage for OAuth sessions, keyed by DID.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Lists the DIDs with a stored session.
    async fn list(&self) -> Result<Vec<Did>>;

    /// Loads the session stored for `did`.
    async fn get(&self, did: &Did) -> Result<Option<StoredSession>>;

    /// Stores `session`, replacing any session for the same DID.
    async fn put(&self, session: &StoredSession) -> Result<()>;

    /// Deletes the session stored for `did`. Deleting a missing session is not
    /// an error.
    async fn delete(&self, did: &Did) -> Result<()>;
}
