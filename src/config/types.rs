// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub files: FilesConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

/// How accepted connections are scheduled
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    /// One thread waits on the listener and every open slot together
    #[default]
    Multiplexed,
    /// One task per accepted connection, one exchange each, private cache
    WorkerPerConnection,
}

/// Listening socket and connection table
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Listen backlog depth
    pub backlog: i32,
    /// Size of the connection slot table in multiplexed mode
    pub max_clients: usize,
    #[serde(default)]
    pub mode: SchedulingMode,
}

/// Document root and file cache
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FilesConfig {
    pub document_root: String,
    pub index_file: String,
    pub cache_capacity: usize,
}

/// Request parsing limits
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// Bytes taken from a connection per readiness event
    pub read_buffer_size: usize,
    pub max_method_len: usize,
    pub max_target_len: usize,
    pub max_version_len: usize,
    /// Expose the `/api` and `/contact` routes
    pub enable_routes: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (common, combined or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "common".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 8192,
            max_method_len: 8,
            max_target_len: 255,
            max_version_len: 16,
            enable_routes: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: default_access_log_format(),
        }
    }
}
