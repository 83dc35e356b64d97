//! In-memory storage backends.
//!
//! Useful for ephemeral processes and tests; nothing survives a restart.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::Result;
use crate::traits::{KeyValueStore, SessionStorage, StoredSession};
use crate::types::Did;

/// A [`KeyValueStore`] backed by a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A [`SessionStorage`] backed by a map.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    sessions: Mutex<BTreeMap<Did, StoredSession>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn list(&self) -> Result<Vec<Did>> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(sessions.keys().cloned().collect())
    }

    async fn get(&self, did: &Did) -> Result<Option<StoredSession>> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(sessions.get(did).cloned())
    }

    async fn put(&self, session: &StoredSession) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session.did.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, did: &Did) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(did);
        Ok(())
    }
}
