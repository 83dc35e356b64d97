//! One JSON file per stored session.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument, warn};

use tern_core::Result;
use tern_core::traits::{SessionStorage, StoredSession};
use tern_core::types::Did;

use crate::{map_io, map_json};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// A [`SessionStorage`] that writes `<did>.json` files into a directory.
///
/// Session files hold bearer tokens and are created readable by the owner
/// only on Unix.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    dir: PathBuf,
}

impl FileSessionStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self, did: &Did) -> PathBuf {
        // Windows does not allow ':' in path segments.
        self.dir
            .join(format!("{}.json", did.as_str().replace(':', "_")))
    }

    async fn read(path: &Path) -> Result<Option<StoredSession>> {
        match fs::read_to_string(path).await {
            Ok(json) => serde_json::from_str(&json).map(Some).map_err(map_json),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(map_io(err)),
        }
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn list(&self) -> Result<Vec<Did>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(map_io(err)),
        };

        let mut dids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(map_io)? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match Self::read(&path).await {
                Ok(Some(session)) => dids.push(session.did),
                Ok(None) => {}
                Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable session file"),
            }
        }
        dids.sort();
        Ok(dids)
    }

    async fn get(&self, did: &Did) -> Result<Option<StoredSession>> {
        Self::read(&self.session_path(did)).await
    }

    #[instrument(skip(self, session), fields(did = %session.did))]
    async fn put(&self, session: &StoredSession) -> Result<()> {
        fs::create_dir_all(&self.dir).await.map_err(map_io)?;
        let path = self.session_path(&session.did);
        let json = serde_json::to_string_pretty(session).map_err(map_json)?;
        fs::write(&path, json).await.map_err(map_io)?;

        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&path).await.map_err(map_io)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms).await.map_err(map_io)?;
        }

        debug!(path = %path.display(), "session stored");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, did: &Did) -> Result<()> {
        match fs::remove_file(self.session_path(did)).await {
            Ok(()) => {
                debug!("session deleted");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(map_io(err)),
        }
    }
}
