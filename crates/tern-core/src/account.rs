//! The persisted record of a signed-in identity.

use serde::{Deserialize, Serialize};

use crate::types::{Did, PdsUrl};

/// Who is signed in and where their data lives.
///
/// Serialized as `{"handle": ..., "did": ..., "pds": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub handle: String,
    pub did: Did,
    pub pds: PdsUrl,
}

impl Account {
    pub fn new(handle: impl Into<String>, did: Did, pds: PdsUrl) -> Self {
        Self {
            handle: handle.into(),
            did,
            pds,
        }
    }
}
