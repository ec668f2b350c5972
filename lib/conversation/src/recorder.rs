//! Append-only recorders for leads and feedback.
//!
//! The in-memory list is authoritative for the running process. When a
//! snapshot path is configured, every append rewrites that file with the
//! full list; write failures are logged and never reach the caller.

use crate::error::PersistenceError;
use crate::record::Record;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Trait for record storage shared by every session.
#[async_trait]
pub trait Recorder<R: Record>: Send + Sync {
    /// Appends a record and returns its 1-based position.
    async fn append(&self, record: R) -> usize;

    /// Returns every record in append order.
    async fn list(&self) -> Vec<R>;

    /// Returns the number of records.
    async fn len(&self) -> usize {
        self.list().await.len()
    }
}

/// Recorder backed by an in-memory list and an optional JSON snapshot file.
#[derive(Debug)]
pub struct JsonFileRecorder<R> {
    records: Mutex<Vec<R>>,
    snapshot: Option<PathBuf>,
}

impl<R: Record> JsonFileRecorder<R> {
    /// Creates a recorder that never touches the filesystem.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            snapshot: None,
        }
    }

    /// Creates an empty recorder that snapshots to `path`.
    #[must_use]
    pub fn with_snapshot(path: impl Into<PathBuf>) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            snapshot: Some(path.into()),
        }
    }

    /// Creates a recorder that snapshots to `path`, restoring any records a
    /// previous process left there.
    ///
    /// A malformed snapshot is renamed to `<path>.corrupt` and the recorder
    /// starts empty. If it cannot be moved aside, the recorder keeps records
    /// in memory only rather than overwrite it.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::with_snapshot(path),
            Err(e) => {
                warn!(kind = R::KIND, error = %e, path = %path.display(), "ignoring unreadable snapshot");
                return Self::with_snapshot(path);
            }
        };

        match serde_json::from_slice::<Vec<R>>(&bytes) {
            Ok(records) => {
                debug!(kind = R::KIND, count = records.len(), path = %path.display(), "restored snapshot");
                Self {
                    records: Mutex::new(records),
                    snapshot: Some(path),
                }
            }
            Err(e) => {
                let aside = corrupt_path(&path);
                match tokio::fs::rename(&path, &aside).await {
                    Ok(()) => {
                        warn!(
                            kind = R::KIND,
                            error = %e,
                            path = %path.display(),
                            moved_to = %aside.display(),
                            "malformed snapshot moved aside"
                        );
                        Self::with_snapshot(path)
                    }
                    Err(rename) => {
                        warn!(
                            kind = R::KIND,
                            error = %e,
                            rename_error = %rename,
                            path = %path.display(),
                            "malformed snapshot kept, recording in memory only"
                        );
                        Self::in_memory()
                    }
                }
            }
        }
    }

    /// Returns the snapshot file, if any.
    #[must_use]
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }
}

#[async_trait]
impl<R: Record> Recorder<R> for JsonFileRecorder<R> {
    async fn append(&self, record: R) -> usize {
        // The lock is held across the snapshot write so concurrent appends
        // never interleave file contents.
        let mut records = self.records.lock().await;
        record.log_appended(records.len() + 1);
        records.push(record);
        let position = records.len();

        if let Some(path) = &self.snapshot {
            if let Err(e) = write_snapshot(path, &records).await {
                warn!(kind = R::KIND, error = %e, "snapshot write failed, keeping in-memory record");
            }
        }

        position
    }

    async fn list(&self) -> Vec<R> {
        self.records.lock().await.clone()
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}

async fn write_snapshot<R: Serialize>(path: &Path, records: &[R]) -> Result<(), PersistenceError> {
    let bytes = serde_json::to_vec_pretty(records).map_err(|e| PersistenceError::Serialize {
        reason: e.to_string(),
    })?;

    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, bytes)
        .await
        .map_err(|e| PersistenceError::Write {
            path: staging.clone(),
            reason: e.to_string(),
        })?;
    tokio::fs::rename(&staging, path)
        .await
        .map_err(|e| PersistenceError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}
