//! Request handler module
//!
//! Responsible for request dispatch: registered routes first, then static
//! files from the document root.

pub mod router;
pub mod routes;
pub mod static_files;

// Re-export main entry point
pub use router::{Exchange, RequestHandler, RequestSummary};
pub use routes::{RouteHandler, Routes};
