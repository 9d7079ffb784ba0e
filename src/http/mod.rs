//! HTTP protocol layer module
//!
//! Request parsing, request-target sanitization, MIME lookup and response
//! serialization. Nothing here touches a socket or the filesystem.

pub mod mime;
pub mod request;
pub mod response;
pub mod sanitize;

// Re-export commonly used types
pub use request::{FieldLimits, Method, Request};
pub use response::{Response, StatusCode};
pub use sanitize::{sanitize, SanitizedPath};
