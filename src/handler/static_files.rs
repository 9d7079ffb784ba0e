//! Static file serving module
//!
//! Maps a sanitized path onto the document root, probes the result and
//! fetches its bytes through the file cache.

use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::FileCache;
use crate::error::FileError;
use crate::http::{mime, Response, SanitizedPath};
use crate::logger;

/// Absolute filesystem path for a sanitized request path
///
/// Empty paths, paths ending in `/` and paths naming a directory resolve to
/// that directory's index file.
pub fn resolve(document_root: &Path, path: &SanitizedPath, index_file: &str) -> PathBuf {
    let mut full = document_root.join(path.relative());
    if path.is_directory_like() || full.is_dir() {
        full.push(index_file);
    }
    full
}

/// Existence probe followed by a readability probe
///
/// Missing files and directories are `NotFound`; files that exist but cannot
/// be opened are `Unreadable`.
pub fn probe(path: &Path) -> Result<(), FileError> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(FileError::NotFound);
    }
    match fs::File::open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FileError::NotFound),
        Err(e) => Err(FileError::Unreadable(e)),
    }
}

/// Serve one resolved file, mapping failures to 404 or 403
pub fn serve_file(path: &Path, cache: &mut FileCache) -> Response {
    let result = probe(path).and_then(|()| cache.get(path));
    match result {
        Ok(data) => Response::ok(mime::content_type_for(path), data),
        Err(e) => {
            logger::log_file_error(path, &e);
            Response::error(e.status())
        }
    }
}
