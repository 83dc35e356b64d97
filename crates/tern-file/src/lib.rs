//! tern-file - Filesystem-backed durable storage.
//!
//! [`FileKeyValueStore`] persists the session store's account slot;
//! [`FileSessionStorage`] keeps one token file per DID for the OAuth client.

mod kv;
mod sessions;

pub use kv::FileKeyValueStore;
pub use sessions::FileSessionStorage;

use tern_core::error::{Error, StorageError};

fn map_io(err: std::io::Error) -> Error {
    Error::Storage(StorageError::Io {
        message: err.to_string(),
    })
}

fn map_json(err: serde_json::Error) -> Error {
    Error::Storage(StorageError::from(err))
}
