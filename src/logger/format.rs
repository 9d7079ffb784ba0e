//! Access log format module
//!
//! Supported formats:
//! - `common` (Common Log Format - CLF)
//! - `combined` (CLF plus user agent and connection disposition)
//! - `json` (one JSON object per exchange)
//!
//! Unknown format names fall back to `common`.

use chrono::Local;
use serde_json::json;

/// Access log entry for one request/response exchange
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client address
    pub remote_addr: String,
    /// Time handling of the request began
    pub time: chrono::DateTime<Local>,
    /// Method token as received (possibly truncated)
    pub method: String,
    /// Request-target as received, before sanitization
    pub target: String,
    /// Version token as received, e.g. `HTTP/1.1`
    pub version: String,
    /// Response status code
    pub status: u16,
    /// Response body size in bytes
    pub body_bytes: usize,
    /// Whether the connection stayed open after the response
    pub keep_alive: bool,
    /// User-Agent header
    pub user_agent: Option<String>,
    /// Handling time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create a new entry stamped with the current local time
    pub fn new(remote_addr: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method: "-".to_string(),
            target: "-".to_string(),
            version: "-".to_string(),
            status: 0,
            body_bytes: 0,
            keep_alive: false,
            user_agent: None,
            request_time_us: 0,
        }
    }

    /// Format the entry according to the named format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "json" => self.format_json(),
            _ => self.format_common(),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} {}", self.method, self.target, self.version)
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    fn format_combined(&self) -> String {
        #[allow(clippy::cast_precision_loss)]
        let seconds = self.request_time_us as f64 / 1_000_000.0;
        format!(
            "{} \"{}\" {} {:.3}",
            self.format_common(),
            self.user_agent.as_deref().unwrap_or("-"),
            if self.keep_alive { "keep-alive" } else { "close" },
            seconds,
        )
    }

    fn format_json(&self) -> String {
        json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "target": self.target,
            "version": self.version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "keep_alive": self.keep_alive,
            "user_agent": self.user_agent,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }
}
