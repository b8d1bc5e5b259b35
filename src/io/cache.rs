//! Read-through cache over raw-table loads.
//!
//! Entries are keyed by source path and validated against a SHA-256 of the
//! file content on every load, so an edited file is re-parsed while an
//! unchanged one is served from memory. Tables are handed out as `Arc`s and are
//! never mutated, so every caller sees the same immutable data.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::domain::RawTable;
use crate::error::AppError;
use crate::io::ingest::parse_raw_table;

#[derive(Debug)]
struct CacheEntry {
    fingerprint: String,
    table: Arc<RawTable>,
}

/// Result of a cached load.
#[derive(Debug, Clone)]
pub struct CachedLoad {
    pub table: Arc<RawTable>,
    /// Lowercase hex SHA-256 of the file content.
    pub fingerprint: String,
    /// `true` when the table was served without re-parsing.
    pub hit: bool,
}

#[derive(Debug, Default)]
pub struct RawTableCache {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
}

impl RawTableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path`, reusing the cached table when the content is unchanged.
    pub fn load(&self, path: &Path) -> Result<CachedLoad, AppError> {
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::new(2, format!("Failed to read CSV '{}': {e}", path.display())))?;
        let fingerprint = content_fingerprint(&bytes);

        let mut entries = self.lock()?;
        if let Some(entry) = entries.get(path) {
            if entry.fingerprint == fingerprint {
                debug!(path = %path.display(), fingerprint = %fingerprint, "raw table cache hit");
                return Ok(CachedLoad {
                    table: Arc::clone(&entry.table),
                    fingerprint,
                    hit: true,
                });
            }
        }

        let table = Arc::new(parse_raw_table(bytes.as_slice())?);
        info!(path = %path.display(), rows = table.len(), fingerprint = %fingerprint, "loaded raw table");
        entries.insert(
            path.to_path_buf(),
            CacheEntry {
                fingerprint: fingerprint.clone(),
                table: Arc::clone(&table),
            },
        );

        Ok(CachedLoad {
            table,
            fingerprint,
            hit: false,
        })
    }

    /// Drop the entry for `path`. Returns whether one existed.
    pub fn invalidate(&self, path: &Path) -> Result<bool, AppError> {
        Ok(self.lock()?.remove(path).is_some())
    }

    pub fn clear(&self) -> Result<(), AppError> {
        self.lock()?.clear();
        Ok(())
    }

    pub fn len(&self) -> Result<usize, AppError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, AppError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<PathBuf, CacheEntry>>, AppError> {
        self.entries
            .lock()
            .map_err(|_| AppError::new(4, "Raw table cache lock poisoned."))
    }
}

/// Lowercase hex SHA-256 of the file content.
pub fn content_fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
