//! Snapshot files on disk, one `<session-id>.json` per session.
//!
//! Every write for a session carries a version taken from that session's counter and goes
//! through the session's [`WriteSlot`]. A write older than the last one applied is dropped,
//! so background writes that finish out of order never put an older state back, and nothing
//! written after a delete brings the file back.

use crate::models::SessionState;
use crate::snapshot;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Orders the file writes of one session; holds the last version applied.
#[derive(Clone, Debug, Default)]
pub struct WriteSlot(Arc<Mutex<u64>>);

impl WriteSlot {
    pub async fn applied_version(&self) -> u64 {
        *self.0.lock().await
    }
}

#[derive(Clone, Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Write `json` as version `version` of the session. Returns `false` when a newer write
    /// (or the delete) already went through and this one was dropped.
    pub async fn save(
        &self,
        id: Uuid,
        slot: &WriteSlot,
        version: u64,
        json: String,
    ) -> io::Result<bool> {
        let mut applied = slot.0.lock().await;
        if version <= *applied {
            log::debug!("Dropped stale snapshot v{} of session {}", version, id);
            return Ok(false);
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = self.dir.join(format!("{}.{}.json.tmp", id, version));
        tokio::fs::write(&tmp, json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, self.path(id)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        *applied = version;
        Ok(true)
    }

    /// Delete the session's file as version `version`; older pending writes are dropped.
    pub async fn remove(&self, id: Uuid, slot: &WriteSlot, version: u64) -> io::Result<bool> {
        let mut applied = slot.0.lock().await;
        if version <= *applied {
            return Ok(false);
        }
        match tokio::fs::remove_file(self.path(id)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
            _ => {}
        }
        *applied = version;
        Ok(true)
    }

    /// Every readable snapshot in the directory. Unreadable files are logged and skipped.
    pub async fn load_all(&self) -> HashMap<Uuid, SessionState> {
        let mut sessions = HashMap::new();
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) => {
                log::info!("No snapshots loaded from {}: {}", self.dir.display(), e);
                return sessions;
            }
        };
        while let Ok(Some(file)) = dir.next_entry().await {
            let path = file.path();
            let id = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|n| n.parse::<Uuid>().ok());
            let Some(id) = id else { continue };
            let loaded = match tokio::fs::read_to_string(&path).await {
                Ok(json) => snapshot::from_json(&json).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match loaded {
                Ok(state) => {
                    sessions.insert(id, state);
                }
                Err(e) => log::warn!("Skipping snapshot {}: {}", path.display(), e),
            }
        }
        log::info!("Loaded {} session snapshot(s)", sessions.len());
        sessions
    }
}
