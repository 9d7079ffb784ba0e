// Configuration module entry point
// Loads layered configuration and validates it before anything is bound

mod types;

use std::net::SocketAddr;
use std::path::Path;

use crate::error::StartupError;

// Re-export public types
pub use types::{Config, FilesConfig, HttpConfig, LoggingConfig, SchedulingMode, ServerConfig};

/// Largest accepted listen backlog
const MAX_BACKLOG: i32 = 128;

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.backlog", 10)?
            .set_default("server.max_clients", 10)?
            .set_default("server.mode", "multiplexed")?
            .set_default("files.document_root", "./www")?
            .set_default("files.index_file", "index.html")?
            .set_default("files.cache_capacity", 10)?
            .set_default("http.read_buffer_size", 8192)?
            .set_default("http.max_method_len", 8)?
            .set_default("http.max_target_len", 255)?
            .set_default("http.max_version_len", 16)?
            .set_default("http.enable_routes", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SFSERVE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Check everything that must hold before a socket is created
    pub fn validate(&self) -> Result<(), StartupError> {
        let root = Path::new(&self.files.document_root);
        if !root.is_dir() {
            return Err(StartupError::InvalidDocumentRoot {
                path: self.files.document_root.clone(),
            });
        }

        if self.files.index_file.is_empty() || self.files.index_file.contains('/') {
            return Err(StartupError::InvalidSetting {
                name: "files.index_file",
                reason: format!("'{}' must be a plain file name", self.files.index_file),
            });
        }

        let non_zero = [
            ("server.max_clients", self.server.max_clients),
            ("files.cache_capacity", self.files.cache_capacity),
            ("http.read_buffer_size", self.http.read_buffer_size),
            ("http.max_method_len", self.http.max_method_len),
            ("http.max_target_len", self.http.max_target_len),
            ("http.max_version_len", self.http.max_version_len),
        ];
        for (name, value) in non_zero {
            if value == 0 {
                return Err(StartupError::InvalidSetting {
                    name,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if !(1..=MAX_BACKLOG).contains(&self.server.backlog) {
            return Err(StartupError::InvalidSetting {
                name: "server.backlog",
                reason: format!("{} is outside 1..={MAX_BACKLOG}", self.server.backlog),
            });
        }

        self.socket_addr().map(|_| ())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, StartupError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| StartupError::InvalidSetting {
                name: "server.host",
                reason: format!("invalid address: {e}"),
            })
    }

    /// Configuration rooted at `document_root`, everything else default.
    /// Handy for embedding and tests.
    pub fn with_document_root(document_root: impl Into<String>) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                backlog: 10,
                max_clients: 10,
                mode: SchedulingMode::Multiplexed,
            },
            files: FilesConfig {
                document_root: document_root.into(),
                index_file: "index.html".to_string(),
                cache_capacity: 10,
            },
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
