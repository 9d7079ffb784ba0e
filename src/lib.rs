//! sfserve: a small static file server speaking a subset of HTTP/1.1
//!
//! Requests are parsed from a single read, checked against a path
//! whitelist, dispatched to a registered route or to a file under the
//! document root, and answered from an mtime-validated in-memory cache.
//! Connections are scheduled either by a single-threaded multiplexer with a
//! fixed number of slots or by one worker task per connection.

pub mod cache;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
