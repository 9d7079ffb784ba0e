//! HTTP response building module
//!
//! Pure construction of wire-format responses: status line, the fixed
//! `Content-Type` / `Content-Length` / `Connection` headers, a blank line and
//! the body. No I/O happens here.

use bytes::Bytes;
use std::fmt;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Status codes this server produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok,
    BadRequest,
    Forbidden,
    NotFound,
    NotImplemented,
}

impl StatusCode {
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::NotImplemented => 501,
        }
    }

    pub const fn reason_phrase(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::BadRequest => "Bad Request",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::NotImplemented => "Not Implemented",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// A complete response, ready to serialize
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: Bytes,
    pub keep_alive: bool,
}

impl Response {
    pub fn new(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
            keep_alive: false,
        }
    }

    /// 200 with the given body
    pub fn ok(content_type: &'static str, body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::Ok, content_type, body)
    }

    /// Canned error page for a non-200 status
    pub fn error(status: StatusCode) -> Self {
        Self::new(status, "text/html", canned_body(status))
    }

    #[must_use]
    pub const fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// Serialize status line, headers, blank line and body
    pub fn to_bytes(&self) -> Vec<u8> {
        let head = format!(
            "{HTTP_VERSION} {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: {}\r\n\r\n",
            self.status.as_u16(),
            self.status.reason_phrase(),
            self.content_type,
            self.body.len(),
            if self.keep_alive { "keep-alive" } else { "close" },
        );

        let mut buf = Vec::with_capacity(head.len() + self.body.len());
        buf.extend_from_slice(head.as_bytes());
        buf.extend_from_slice(&self.body);
        buf
    }
}

/// Literal body text for the canned error responses
pub const fn canned_body(status: StatusCode) -> &'static str {
    match status {
        StatusCode::Ok => "",
        StatusCode::BadRequest => {
            "<html><body><h1>400 Bad Request</h1><p>The request could not be understood.</p></body></html>"
        }
        StatusCode::Forbidden => {
            "<html><body><h1>403 Forbidden</h1><p>Access to this resource is denied.</p></body></html>"
        }
        StatusCode::NotFound => {
            "<html><body><h1>404 Not Found</h1><p>The requested file does not exist.</p></body></html>"
        }
        StatusCode::NotImplemented => {
            "<html><body><h1>501 Not Implemented</h1><p>Only GET is supported.</p></body></html>"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_wire_format() {
        let resp = Response::ok("text/plain", "hello").with_keep_alive(true);
        assert_eq!(
            resp.to_bytes(),
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\nConnection: keep-alive\r\n\r\nhello"
        );
    }

    #[test]
    fn test_close_is_default() {
        let wire = Response::ok("text/html", "").to_bytes();
        let text = String::from_utf8(wire).unwrap();
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_canned_errors_have_exact_length() {
        for status in [
            StatusCode::BadRequest,
            StatusCode::Forbidden,
            StatusCode::NotFound,
            StatusCode::NotImplemented,
        ] {
            let resp = Response::error(status);
            let text = String::from_utf8(resp.to_bytes()).unwrap();
            let expected_len = canned_body(status).len();

            assert!(text.starts_with(&format!("HTTP/1.1 {status}\r\n")));
            assert!(text.contains(&format!("Content-Length: {expected_len}\r\n")));
            assert!(text.ends_with(canned_body(status)));
            assert_eq!(resp.content_length(), expected_len);
        }
    }

    #[test]
    fn test_binary_body_is_untouched() {
        let body: Vec<u8> = vec![0, 159, 146, 150, 255];
        let wire = Response::ok("image/png", body.clone()).to_bytes();
        assert!(wire.ends_with(&body));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(StatusCode::NotFound.to_string(), "404 Not Found");
        assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    }
}
