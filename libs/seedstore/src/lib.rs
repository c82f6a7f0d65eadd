//! File-backed seed store.
//!
//! Keeps the last issued identifier of a shared counter in a single JSON
//! record, so that independent processes can issue from one sequence:
//!
//! ```text
//! {
//!   "version": 1,
//!   "last_id": "90B12348",
//!   "swaps": 42
//! }
//! ```
//!
//! - Writes go to a temp file and are renamed over the record
//! - Compare-and-swap runs under an OS lock on `<record>.lock`, which the
//!   kernel drops if the holder dies
//! - Readers never take the lock; they always see a whole record

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use fs2::FileExt;
use idstring::{CasSeedStore, IdError, SeedBackend};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Record format version.
pub const RECORD_VERSION: u32 = 1;

/// Default number of attempts to take the lock file.
pub const DEFAULT_LOCK_ATTEMPTS: u32 = 200;

/// Default pause between lock attempts.
pub const DEFAULT_LOCK_RETRY: Duration = Duration::from_millis(10);

/// File store errors.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// IO error.
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The record is not valid JSON.
    #[error("failed to parse seed record {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The record was written by an incompatible version.
    #[error("unsupported seed record version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// The lock file could not be taken.
    #[error("timed out waiting for lock {}", .path.display())]
    LockTimeout { path: PathBuf },
}

impl From<FileStoreError> for IdError {
    fn from(err: FileStoreError) -> Self {
        IdError::Store(err.to_string())
    }
}

/// The persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRecord {
    /// Format version.
    pub version: u32,
    /// Last issued identifier.
    pub last_id: String,
    /// Number of successful swaps, including initialization.
    #[serde(default)]
    pub swaps: u64,
}

/// A [`SeedBackend`] over one JSON record file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
    lock_path: PathBuf,
    lock_attempts: u32,
    lock_retry: Duration,
}

impl FileBackend {
    /// Creates a backend for the record at `path`. The file is created on the
    /// first swap.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        Self {
            path,
            lock_path,
            lock_attempts: DEFAULT_LOCK_ATTEMPTS,
            lock_retry: DEFAULT_LOCK_RETRY,
        }
    }

    /// Overrides how long a swap waits for the lock.
    #[must_use]
    pub fn with_lock_retry(mut self, attempts: u32, pause: Duration) -> Self {
        self.lock_attempts = attempts.max(1);
        self.lock_retry = pause;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the record, if the file exists.
    pub fn read_record(&self) -> Result<Option<SeedRecord>, FileStoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!(path = %self.path.display(), "no seed record yet");
                return Ok(None);
            }
            Err(source) => {
                return Err(FileStoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let record: SeedRecord =
            serde_json::from_str(&content).map_err(|source| FileStoreError::Parse {
                path: self.path.clone(),
                source,
            })?;

        if record.version != RECORD_VERSION {
            return Err(FileStoreError::UnsupportedVersion {
                found: record.version,
                expected: RECORD_VERSION,
            });
        }

        Ok(Some(record))
    }

    /// Writes the record atomically (temp file + rename).
    fn write_record(&self, record: &SeedRecord) -> Result<(), FileStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err(parent))?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        let content = serde_json::to_string_pretty(record).map_err(|source| {
            FileStoreError::Parse {
                path: tmp_path.clone(),
                source,
            }
        })?;

        let mut tmp = File::create(&tmp_path).map_err(io_err(&tmp_path))?;
        tmp.write_all(content.as_bytes())
            .and_then(|()| tmp.sync_all())
            .map_err(io_err(&tmp_path))?;
        drop(tmp);
        fs::rename(&tmp_path, &self.path).map_err(io_err(&self.path))?;
        Ok(())
    }

    fn acquire_lock(&self) -> Result<LockGuard, FileStoreError> {
        if let Some(parent) = self.lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err(parent))?;
            }
        }

        // The file stays on disk; only the OS lock on it is taken and dropped,
        // so a holder that dies never leaves the record locked.
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(io_err(&self.lock_path))?;

        for attempt in 1..=self.lock_attempts {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(LockGuard { file }),
                Err(e) if is_contended(&e) => {
                    trace!(path = %self.lock_path.display(), attempt, "seed record locked, retrying");
                    thread::sleep(self.lock_retry);
                }
                Err(source) => {
                    return Err(FileStoreError::Io {
                        path: self.lock_path.clone(),
                        source,
                    })
                }
            }
        }

        warn!(path = %self.lock_path.display(), "gave up waiting for seed record lock");
        Err(FileStoreError::LockTimeout {
            path: self.lock_path.clone(),
        })
    }
}

impl SeedBackend for FileBackend {
    fn load(&self) -> Result<Option<String>, IdError> {
        Ok(self.read_record()?.map(|record| record.last_id))
    }

    fn compare_and_swap(&self, expected: Option<&str>, new: &str) -> Result<bool, IdError> {
        let _lock = self.acquire_lock()?;

        let current = self.read_record()?;
        if current.as_ref().map(|r| r.last_id.as_str()) != expected {
            debug!(
                path = %self.path.display(),
                expected = expected.unwrap_or("-"),
                stored = current.as_ref().map_or("-", |r| r.last_id.as_str()),
                "seed record changed underneath us"
            );
            return Ok(false);
        }

        let record = SeedRecord {
            version: RECORD_VERSION,
            last_id: new.to_string(),
            swaps: current.map_or(0, |r| r.swaps) + 1,
        };
        self.write_record(&record)?;

        debug!(path = %self.path.display(), last_id = %new, swaps = record.swaps, "stored seed record");
        Ok(true)
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> FileStoreError {
    let path = path.to_path_buf();
    move |source| FileStoreError::Io { path, source }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Holds the exclusive lock on the lock file until dropped.
struct LockGuard {
    file: File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(error = %e, "failed to release seed record lock");
        }
    }
}

/// A seed store for one issuer over the record at `path`.
pub fn file_seed_store(path: impl Into<PathBuf>) -> CasSeedStore<FileBackend> {
    CasSeedStore::new(FileBackend::new(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization() {
        let record = SeedRecord {
            version: RECORD_VERSION,
            last_id: "90B12348".to_string(),
            swaps: 3,
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: SeedRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_record_without_swaps_defaults_to_zero() {
        let parsed: SeedRecord =
            serde_json::from_str(r#"{"version":1,"last_id":"00"}"#).unwrap();
        assert_eq!(parsed.swaps, 0);
    }

    #[test]
    fn test_lock_path_sits_beside_record() {
        let backend = FileBackend::new("/var/lib/ids/counter.json");
        assert_eq!(backend.lock_path, PathBuf::from("/var/lib/ids/counter.lock"));
    }

    #[test]
    fn test_store_error_converts_to_id_error() {
        let err: IdError = FileStoreError::UnsupportedVersion {
            found: 9,
            expected: RECORD_VERSION,
        }
        .into();
        assert!(matches!(err, IdError::Store(msg) if msg.contains("version 9")));
    }
}
