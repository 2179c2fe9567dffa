//! On-device key-value storage.
//!
//! A small string map persisted as JSON. Each write replaces the whole
//! file. The file is wrapped in an envelope carrying a SHA256 checksum and
//! a format version; a file that fails either check is treated as empty so
//! the app falls back to the logged-out state instead of refusing to start.
//!
//! # Example
//!
//! ```no_run
//! use codealarm::storage::KvStore;
//!
//! let mut store = KvStore::open("/tmp/codealarm/identity.json").unwrap();
//! store.set("username", "alice").unwrap();
//! assert_eq!(store.get("username"), Some("alice"));
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Current version of the store file format.
pub const STORE_VERSION: u32 = 1;

/// File name of the identity store inside the storage directory.
pub const STORE_FILE_NAME: &str = "identity.json";

/// Error reading or writing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization failure.
    #[error("failed to encode store: {0}")]
    Encode(#[from] serde_json::Error),

    /// The store file exists but did not pass validation.
    #[error("store file is corrupted: {0}")]
    Corrupted(String),

    /// No platform data directory could be determined.
    #[error("failed to determine the platform data directory")]
    NoDataDir,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    version: u32,
    entries: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreEnvelope {
    checksum: String,
    data: StoreData,
}

fn checksum(data: &StoreData) -> Result<String, StoreError> {
    let json = serde_json::to_string(data)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Persistent string map backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct KvStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl KvStore {
    /// Open the store at `path`.
    ///
    /// A missing file yields an empty store. A corrupted file is logged and
    /// also yields an empty store; it is overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            match Self::read_entries(&path) {
                Ok(entries) => entries,
                Err(e @ StoreError::Io { .. }) => return Err(e),
                Err(e) => {
                    log::warn!("Ignoring store at {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    fn read_entries(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let envelope: StoreEnvelope = serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupted(format!("unreadable envelope: {e}")))?;

        if checksum(&envelope.data)? != envelope.checksum {
            return Err(StoreError::Corrupted("checksum mismatch".to_string()));
        }
        if envelope.data.version != STORE_VERSION {
            return Err(StoreError::Corrupted(format!(
                "unsupported version {} (expected {})",
                envelope.data.version, STORE_VERSION
            )));
        }
        Ok(envelope.data.entries)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Set a value and write the store to disk.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<(), StoreError> {
        let (key, value) = (key.into(), value.into());
        self.update(|entries| {
            entries.insert(key, value);
        })
    }

    /// Remove a value and write the store to disk.
    pub fn remove(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        let mut removed = None;
        self.update(|entries| removed = entries.remove(key))?;
        Ok(removed)
    }

    /// Apply several edits as one write.
    ///
    /// The edits run against a copy of the entries. The copy replaces the
    /// in-memory map only after it reached disk, so a failed write leaves
    /// the store exactly as it was.
    pub fn update<F>(&mut self, edit: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut next = self.entries.clone();
        edit(&mut next);
        if next == self.entries {
            return Ok(());
        }
        self.write_entries(&next)?;
        self.entries = next;
        Ok(())
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let data = StoreData {
            version: STORE_VERSION,
            entries: entries.clone(),
        };
        let envelope = StoreEnvelope {
            checksum: checksum(&data)?,
            data,
        };
        let json = serde_json::to_string_pretty(&envelope)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Platform data directory for codealarm.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let dirs = ProjectDirs::from("com", "codealarm", "codealarm").ok_or(StoreError::NoDataDir)?;
    Ok(dirs.data_dir().to_path_buf())
}
