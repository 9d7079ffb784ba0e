//! Request routing dispatch module
//!
//! Entry point for one request/response exchange: parse, method check,
//! route match, sanitization, file resolution, cache lookup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::FileCache;
use crate::config::Config;
use crate::error::{RequestError, StartupError};
use crate::handler::routes::Routes;
use crate::handler::static_files;
use crate::http::{sanitize, FieldLimits, Method, Request, Response};
use crate::logger::{self, AccessLogEntry};

/// What was asked, for logging
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSummary {
    pub method: Option<String>,
    pub target: Option<String>,
    pub version: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestSummary {
    fn from_request(req: &Request) -> Self {
        Self {
            method: Some(req.method.as_str().to_string()),
            target: Some(req.target.clone()),
            version: Some(req.version.clone()),
            user_agent: req.header("user-agent").map(ToString::to_string),
        }
    }
}

/// Outcome of handling one request
#[derive(Debug, Clone)]
pub struct Exchange {
    pub response: Response,
    pub summary: RequestSummary,
}

impl Exchange {
    /// Whether the connection stays open after this response
    pub const fn keep_alive(&self) -> bool {
        self.response.keep_alive
    }

    pub fn access_entry(&self, remote_addr: String, elapsed: Duration) -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(remote_addr);
        if let Ok(delta) = chrono::TimeDelta::from_std(elapsed) {
            entry.time -= delta;
        }
        let placeholder = || "-".to_string();
        entry.method = self.summary.method.clone().unwrap_or_else(placeholder);
        entry.target = self.summary.target.clone().unwrap_or_else(placeholder);
        entry.version = self.summary.version.clone().unwrap_or_else(placeholder);
        entry.user_agent.clone_from(&self.summary.user_agent);
        entry.status = self.response.status.as_u16();
        entry.body_bytes = self.response.content_length();
        entry.keep_alive = self.response.keep_alive;
        entry.request_time_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        entry
    }
}

/// Stateless request handler
///
/// Holds only immutable settings and the route table. The file cache is
/// borrowed per call so each scheduling mode decides who owns it.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    document_root: PathBuf,
    index_file: String,
    limits: FieldLimits,
    routes: Arc<Routes>,
}

impl RequestHandler {
    pub fn new(
        document_root: impl Into<PathBuf>,
        index_file: impl Into<String>,
        limits: FieldLimits,
        routes: Arc<Routes>,
    ) -> Self {
        Self {
            document_root: document_root.into(),
            index_file: index_file.into(),
            limits,
            routes,
        }
    }

    /// Build from validated configuration, canonicalizing the document root
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let document_root = std::fs::canonicalize(&config.files.document_root).map_err(|_| {
            StartupError::InvalidDocumentRoot {
                path: config.files.document_root.clone(),
            }
        })?;
        let routes = if config.http.enable_routes {
            Routes::builtin()
        } else {
            Routes::new()
        };

        Ok(Self::new(
            document_root,
            config.files.index_file.clone(),
            FieldLimits::from(&config.http),
            Arc::new(routes),
        ))
    }

    /// Handle the bytes of one read and produce the response to send
    pub fn handle(&self, buf: &[u8], cache: &mut FileCache) -> Exchange {
        let req = match Request::parse(buf, self.limits) {
            Ok(req) => req,
            Err(e) => return Self::reject(&e, RequestSummary::default()),
        };
        let summary = RequestSummary::from_request(&req);
        let keep_alive = req.wants_keep_alive();
        logger::log_request_line(req.method.as_str(), &req.target, keep_alive);

        let route = self.routes.get(&req.target);
        match (&req.method, route) {
            (Method::Get, _) | (Method::Post, Some(_)) => {}
            (method, _) => {
                let err = RequestError::UnsupportedMethod(method.as_str().to_string());
                return Self::reject(&err, summary);
            }
        }

        if let Some(handler) = route {
            logger::log_route_dispatch(&req.target);
            let response = handler(&req).with_keep_alive(keep_alive);
            return Exchange { response, summary };
        }

        let path = match sanitize(&req.target) {
            Ok(path) => path,
            Err(rejection) => return Self::reject(&RequestError::from(rejection), summary),
        };

        let full_path = static_files::resolve(&self.document_root, &path, &self.index_file);
        let response = static_files::serve_file(&full_path, cache).with_keep_alive(keep_alive);
        Exchange { response, summary }
    }

    /// Client input errors never keep the connection open
    fn reject(err: &RequestError, summary: RequestSummary) -> Exchange {
        logger::log_request_rejected(err);
        Exchange {
            response: Response::error(err.status()),
            summary,
        }
    }
}
