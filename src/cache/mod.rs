//! In-memory file cache
//!
//! Whole-file buffers keyed by absolute path, revalidated against the file's
//! modification time on every lookup.

mod file_cache;

pub use file_cache::{CacheStats, FileCache};
