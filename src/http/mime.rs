//! MIME type detection module
//!
//! Returns the Content-Type for a served path from its final `.` suffix.

use std::path::Path;

/// Get MIME Content-Type based on file extension
///
/// Matching is case-sensitive; unknown or missing extensions are served
/// as `application/octet-stream`.
///
/// # Examples
/// ```
/// use sfserve::http::mime::get_content_type;
/// assert_eq!(get_content_type(Some("html")), "text/html");
/// assert_eq!(get_content_type(Some("jpeg")), "image/jpeg");
/// assert_eq!(get_content_type(None), "application/octet-stream");
/// ```
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    match extension {
        Some("html" | "htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain",

        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("svg") => "image/svg+xml",

        _ => "application/octet-stream",
    }
}

/// Content-Type for a resolved filesystem path
pub fn content_type_for(path: &Path) -> &'static str {
    get_content_type(path.extension().and_then(|e| e.to_str()))
}
