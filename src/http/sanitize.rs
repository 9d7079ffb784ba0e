//! Request-target sanitization
//!
//! Turns untrusted request-target text into a safe root-relative path or a
//! [`Rejection`]. The steps run in a fixed order and the first failure wins:
//!
//! 1. cut at the first `?` or `#`
//! 2. textual traversal scan (`../`, `/..`, or exactly `..`)
//! 3. character whitelist: ASCII letters, digits, `/ . - _ %`
//! 4. collapse runs of `/` into one
//!
//! The traversal scan runs on the raw text so that slash collapsing can never
//! hide a `..` segment. Percent escapes are admitted but not decoded.

use std::fmt;

use crate::error::Rejection;

/// A request path that passed [`sanitize`]
///
/// Contains only whitelisted characters, no `..` segment and no `//`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SanitizedPath(String);

impl SanitizedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path relative to the document root (leading `/` removed)
    pub fn relative(&self) -> &str {
        self.0.trim_start_matches('/')
    }

    /// The path names a directory by its shape: empty or ending in `/`
    pub fn is_directory_like(&self) -> bool {
        self.0.is_empty() || self.0.ends_with('/')
    }
}

impl fmt::Display for SanitizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Run the full pipeline on a raw request-target
pub fn sanitize(raw: &str) -> Result<SanitizedPath, Rejection> {
    let stripped = strip_query_and_fragment(raw);

    if contains_traversal(stripped) {
        return Err(Rejection::Traversal);
    }

    if let Some(bad) = stripped.chars().find(|&c| !is_allowed(c)) {
        return Err(Rejection::InvalidCharacter(bad));
    }

    Ok(SanitizedPath(collapse_slashes(stripped)))
}

/// Truncate at the first `?` or `#`, whichever comes first
pub fn strip_query_and_fragment(raw: &str) -> &str {
    raw.find(['?', '#']).map_or(raw, |end| &raw[..end])
}

/// Textual traversal check, no path resolution involved
pub fn contains_traversal(path: &str) -> bool {
    path.contains("../") || path.contains("/..") || path == ".."
}

const fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_' | '%')
}

/// Collapse every run of consecutive `/` into a single `/`
pub fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut last_was_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !last_was_slash {
                out.push(c);
            }
            last_was_slash = true;
        } else {
            out.push(c);
            last_was_slash = false;
        }
    }
    out
}
