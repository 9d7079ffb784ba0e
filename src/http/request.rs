//! Request parsing
//!
//! Reads one request out of the bytes of a single read: the request line,
//! the header block and whatever body followed it. Fields are truncated to
//! configured lengths rather than rejected.

use crate::config::HttpConfig;
use crate::error::RequestError;

/// Request methods this server distinguishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other(String),
}

impl Method {
    pub fn from_token(token: &str) -> Self {
        match token {
            "GET" => Self::Get,
            "POST" => Self::Post,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Other(s) => s,
        }
    }
}

/// Per-field byte limits for the request line
#[derive(Debug, Clone, Copy)]
pub struct FieldLimits {
    pub method: usize,
    pub target: usize,
    pub version: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

impl From<&HttpConfig> for FieldLimits {
    fn from(cfg: &HttpConfig) -> Self {
        Self {
            method: cfg.max_method_len,
            target: cfg.max_target_len,
            version: cfg.max_version_len,
        }
    }
}

/// One parsed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub target: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// Parse a request from the bytes of one read
    pub fn parse(buf: &[u8], limits: FieldLimits) -> Result<Self, RequestError> {
        let line_end = buf
            .iter()
            .position(|&b| b == b'\n')
            .ok_or(RequestError::MalformedRequestLine)?;
        let line = buf[..line_end].strip_suffix(b"\r").unwrap_or(&buf[..line_end]);
        let line = std::str::from_utf8(line).map_err(|_| RequestError::MalformedRequestLine)?;

        // anything after the third token is ignored
        let mut parts = line.split_ascii_whitespace();
        let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(RequestError::MalformedRequestLine);
        };

        let rest = &buf[line_end + 1..];
        let (header_block, body) = split_head_and_body(rest);
        let headers = parse_headers(header_block);

        let mut body = body.to_vec();
        if let Some(len) = header_value(&headers, "content-length")
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            body.truncate(len);
        }

        Ok(Self {
            method: Method::from_token(truncate(method, limits.method)),
            target: truncate(target, limits.target).to_string(),
            version: truncate(version, limits.version).to_string(),
            headers,
            body,
        })
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    /// Keep-alive only when the client asks for it explicitly
    pub fn wants_keep_alive(&self) -> bool {
        self.header("connection").is_some_and(|value| {
            value
                .split(',')
                .any(|token| token.trim().eq_ignore_ascii_case("keep-alive"))
        })
    }
}

/// Split after the request line into (header text, body bytes)
fn split_head_and_body(rest: &[u8]) -> (&[u8], &[u8]) {
    // request line followed directly by the blank line
    if let Some(body) = rest.strip_prefix(b"\r\n") {
        return (&[], body);
    }
    if let Some(body) = rest.strip_prefix(b"\n") {
        return (&[], body);
    }

    match rest.windows(4).position(|w| w == b"\r\n\r\n") {
        Some(pos) => (&rest[..pos], &rest[pos + 4..]),
        None => (rest, &[]),
    }
}

fn parse_headers(block: &[u8]) -> Vec<(String, String)> {
    String::from_utf8_lossy(block)
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Cut `s` to at most `max` bytes without splitting a character
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
