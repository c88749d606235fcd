//! Cache store for persisting the user mapping to disk
//!
//! Provides a `CacheStore` that writes a `MappingRecord` as a versioned JSON
//! document and reads it back with every field, timestamp included, intact.

use chrono::{DateTime, Utc};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::data::MappingRecord;

/// Schema version written into every cache file
pub const CACHE_VERSION: u32 = 1;

/// Location of the cache file relative to the home directory
const CACHE_SUBPATH: &str = ".local/share/userlib/mapping.json";

/// Errors that can occur when reading or writing the cache file
#[derive(Debug, Error)]
pub enum CacheError {
    /// No cache file at the configured location
    #[error("No cached mapping at {}", .0.display())]
    NotFound(PathBuf),

    /// The cache file exists but is not a mapping
    #[error("Cached mapping at {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Reading, writing or creating directories failed
    #[error("Cache I/O failed at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// On-disk layout of the cache file
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    /// Schema version of the writer
    version: u32,
    /// When the mapping was fetched
    updated_at: DateTime<Utc>,
    /// Directory entries in page order
    entries: Vec<CacheEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    id: String,
    name: String,
}

/// Returns `~/.local/share/userlib/mapping.json`
///
/// Returns `None` if the home directory cannot be determined.
pub fn default_cache_path() -> Option<PathBuf> {
    let base_dirs = BaseDirs::new()?;
    Some(base_dirs.home_dir().join(CACHE_SUBPATH))
}

/// Reads and writes the cached mapping at a fixed path
///
/// No locking is done; concurrent writers race and the last one wins.
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Path of the cache file
    path: PathBuf,
}

impl CacheStore {
    /// Creates a new CacheStore for the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a cache file is present
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads the cached mapping
    ///
    /// # Returns
    /// * `Ok(MappingRecord)` with entries and timestamp as saved
    /// * `Err(CacheError::NotFound)` if there is no cache file
    /// * `Err(CacheError::Corrupt)` if the file cannot be decoded
    /// * `Err(CacheError::Io)` if the file cannot be read
    pub fn load(&self) -> Result<MappingRecord, CacheError> {
        let content = fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                CacheError::NotFound(self.path.clone())
            } else {
                self.io_error(source)
            }
        })?;

        let file: CacheFile =
            serde_json::from_str(&content).map_err(|source| CacheError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        if file.version > CACHE_VERSION {
            debug!(
                version = file.version,
                "Reading cache written by a newer schema version"
            );
        }

        let pairs = file.entries.into_iter().map(|e| (e.id, e.name));
        Ok(MappingRecord::new(pairs, file.updated_at))
    }

    /// Writes the mapping, replacing any previous cache file
    ///
    /// Missing parent directories are created first.
    pub fn save(&self, record: &MappingRecord) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = CacheFile {
            version: CACHE_VERSION,
            updated_at: record.updated_at(),
            entries: record
                .entries()
                .map(|(id, name)| CacheEntry {
                    id: id.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| self.io_error(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        fs::write(&self.path, json).map_err(|source| self.io_error(source))?;
        debug!(path = %self.path.display(), entries = record.len(), "Saved mapping");
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> CacheError {
        CacheError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
