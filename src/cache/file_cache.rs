// File cache module
// Bounded path -> bytes map validated against mtime on each lookup

use bytes::Bytes;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::FileError;
use crate::logger;

/// Counters describing cache behaviour since creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from memory
    pub hits: u64,
    /// Lookups that had to read the file
    pub misses: u64,
    /// Entries dropped because the file's mtime changed
    pub reloads: u64,
    /// Full file reads performed
    pub disk_reads: u64,
    /// Entries currently held
    pub entries: usize,
}

struct CacheEntry {
    data: Bytes,
    modified: SystemTime,
}

/// Whole-file cache with a fixed number of slots
///
/// An entry is served only while its recorded mtime equals the file's
/// current mtime. A full cache never evicts a live entry to make room;
/// the new file is served uncached instead.
pub struct FileCache {
    capacity: usize,
    entries: HashMap<PathBuf, CacheEntry>,
    stats: CacheStats,
}

impl FileCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Return the bytes of the file at `path`
    ///
    /// The returned buffer is a cheap handle; it does not keep the entry
    /// alive in the cache.
    pub fn get(&mut self, path: &Path) -> Result<Bytes, FileError> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(FileError::NotFound);
        }
        let modified = metadata.modified().map_err(FileError::Io)?;

        if let Some(entry) = self.entries.get(path) {
            if entry.modified == modified {
                self.stats.hits += 1;
                logger::log_cache_event("hit", path);
                return Ok(entry.data.clone());
            }
            self.entries.remove(path);
            self.stats.reloads += 1;
            logger::log_cache_event("stale, reloading", path);
        }

        self.stats.misses += 1;
        let data = Bytes::from(fs::read(path)?);
        self.stats.disk_reads += 1;

        if self.entries.len() < self.capacity {
            self.entries.insert(
                path.to_path_buf(),
                CacheEntry {
                    data: data.clone(),
                    modified,
                },
            );
            logger::log_cache_event("stored", path);
        } else {
            logger::log_cache_event("full, serving uncached", path);
        }

        Ok(data)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            ..self.stats
        }
    }

    /// Drop every cached buffer, returning how many were held
    pub fn clear(&mut self) -> usize {
        let released = self.entries.len();
        self.entries.clear();
        released
    }
}
