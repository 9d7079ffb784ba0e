//! Registered routes
//!
//! Exact-path handlers that bypass static file serving. The table is built
//! once at startup and never changes afterwards.

use serde_json::json;
use std::collections::HashMap;

use crate::http::{Request, Response};

/// A route handler: request in, complete response out
pub type RouteHandler = fn(&Request) -> Response;

/// Exact request-target -> handler table
#[derive(Clone, Default)]
pub struct Routes {
    table: HashMap<String, RouteHandler>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding `/api` and `/contact`
    pub fn builtin() -> Self {
        let mut routes = Self::new();
        routes.register("/api", api_handler);
        routes.register("/contact", contact_handler);
        routes
    }

    pub fn register(&mut self, path: impl Into<String>, handler: RouteHandler) {
        self.table.insert(path.into(), handler);
    }

    /// Exact match on the raw request-target
    pub fn get(&self, target: &str) -> Option<RouteHandler> {
        self.table.get(target).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }
}

impl std::fmt::Debug for Routes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut paths: Vec<&str> = self.table.keys().map(String::as_str).collect();
        paths.sort_unstable();
        f.debug_struct("Routes").field("paths", &paths).finish()
    }
}

/// `/api`: fixed JSON status message
pub fn api_handler(_req: &Request) -> Response {
    let body = json!({ "message": "API route active" }).to_string();
    Response::ok("application/json", body)
}

/// `/contact`: echoes the request body back
pub fn contact_handler(req: &Request) -> Response {
    let body = format!("Received: {}", String::from_utf8_lossy(&req.body));
    Response::ok("text/plain", body)
}
