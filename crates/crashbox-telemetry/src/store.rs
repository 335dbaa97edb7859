//! Local record storage
//!
//! Pending crash records live as `<timestampMillis>.stacktrace` files in a
//! single directory, by default `~/.local/share/crashbox/traces/`.
//!
//! Records are written to a hidden temp file, synced, then linked into
//! place under a name nobody holds yet, so a `*.stacktrace` entry is either
//! complete or absent and is never replaced. The store
//! does no locking of its own; callers run at most one drain per directory.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crashbox_core::domain::RECORD_EXTENSION;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Errors raised by [`RecordStore`] operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One pending record in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordHandle {
    /// File name, e.g. `1760000000000.stacktrace`
    pub name: String,
    pub path: PathBuf,
    /// Capture time parsed from the file name, `None` for foreign names
    pub timestamp_millis: Option<i64>,
    pub size_bytes: u64,
}

impl RecordHandle {
    /// File name without the record extension.
    pub fn id(&self) -> &str {
        self.name
            .strip_suffix(RECORD_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .unwrap_or(&self.name)
    }
}

/// Directory-backed queue of pending crash records.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    /// Creates a new store pointing at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the default record directory.
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("crashbox")
            .join("traces")
    }

    /// Returns the record directory path.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Point-in-time snapshot of the complete records, oldest first.
    ///
    /// A missing directory is an empty queue. Temp files, foreign files and
    /// zero-byte entries are skipped.
    pub fn list_pending(&self) -> Result<Vec<RecordHandle>, StoreError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io("list", &self.dir, e)),
        };

        let suffix = format!(".{RECORD_EXTENSION}");
        let mut handles = Vec::new();

        for entry in read_dir {
            let entry = entry.map_err(|e| StoreError::io("list", &self.dir, e))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(stem) = name.strip_suffix(&suffix) else {
                continue;
            };
            if stem.is_empty() || stem.starts_with('.') {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                // Consumed by someone else between readdir and stat
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::io("stat", &entry.path(), e)),
            };
            if !metadata.is_file() {
                continue;
            }
            if metadata.len() == 0 {
                debug!(record = name, "Skipping empty record");
                continue;
            }

            handles.push(RecordHandle {
                name: name.to_string(),
                path: entry.path(),
                timestamp_millis: stem.parse().ok(),
                size_bytes: metadata.len(),
            });
        }

        handles.sort_by(|a, b| {
            a.timestamp_millis
                .cmp(&b.timestamp_millis)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(handles)
    }

    /// Full serialized content of a record.
    pub fn read(&self, handle: &RecordHandle) -> Result<Vec<u8>, StoreError> {
        fs::read(&handle.path).map_err(|e| StoreError::io("read", &handle.path, e))
    }

    /// Removes a record. Deleting an entry that is already gone succeeds.
    pub fn delete(&self, handle: &RecordHandle) -> Result<(), StoreError> {
        match fs::remove_file(&handle.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(record = %handle.name, "Record already deleted");
                Ok(())
            }
            Err(e) => Err(StoreError::io("delete", &handle.path, e)),
        }
    }

    /// Durably writes a new record captured at `timestamp_millis`.
    ///
    /// Never replaces an existing record: if the name is taken, by this or
    /// another process, the stamp is bumped by one millisecond until a free
    /// name is found.
    pub fn write(&self, timestamp_millis: i64, contents: &[u8]) -> Result<RecordHandle, StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io("create", &self.dir, e))?;

        let tmp = self
            .dir
            .join(format!(".{timestamp_millis}.{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = write_synced(&tmp, contents) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::io("write", &tmp, e));
        }

        // hard_link fails on an existing target, unlike rename
        let mut stamp = timestamp_millis;
        let path = loop {
            let candidate = self.record_path(stamp);
            match fs::hard_link(&tmp, &candidate) {
                Ok(()) => break candidate,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => stamp += 1,
                Err(e) => {
                    let _ = fs::remove_file(&tmp);
                    return Err(StoreError::io("publish", &candidate, e));
                }
            }
        };
        if let Err(e) = fs::remove_file(&tmp) {
            debug!(tmp = %tmp.display(), error = %e, "Failed to remove temp record");
        }

        // Persist the new link; not supported everywhere
        if let Ok(dir) = File::open(&self.dir) {
            let _ = dir.sync_all();
        }

        Ok(RecordHandle {
            name: format!("{stamp}.{RECORD_EXTENSION}"),
            path,
            timestamp_millis: Some(stamp),
            size_bytes: contents.len() as u64,
        })
    }

    /// Looks up a pending record by id (file stem) or full file name.
    pub fn find(&self, id: &str) -> Result<Option<RecordHandle>, StoreError> {
        Ok(self
            .list_pending()?
            .into_iter()
            .find(|h| h.id() == id || h.name == id))
    }

    /// Deletes every pending record, returning how many were removed.
    pub fn delete_all(&self) -> Result<u32, StoreError> {
        let mut count = 0;
        for handle in self.list_pending()? {
            match self.delete(&handle) {
                Ok(()) => count += 1,
                Err(e) => warn!(error = %e, "Failed to delete record"),
            }
        }
        Ok(count)
    }

    fn record_path(&self, stamp: i64) -> PathBuf {
        self.dir.join(format!("{stamp}.{RECORD_EXTENSION}"))
    }
}

fn write_synced(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}
