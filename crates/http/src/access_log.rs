//! One line per completed request cycle.
//!
//! The line has a fixed layout:
//!
//! ```text
//! [127.0.0.1:52044] "GET /hello HTTP/1.1" 200 0 "curl/8.4.0"
//! ```
//!
//! `Content-Length` and `User-Agent` are taken from the request as received; missing
//! headers print as empty strings.

use std::fmt;
use std::net::SocketAddr;

use http::StatusCode;
use http::header::{CONTENT_LENGTH, USER_AGENT};
use tracing::info;

use crate::protocol::ParsedRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogEntry {
    pub peer: SocketAddr,
    pub method: String,
    pub url: String,
    pub http_version: &'static str,
    pub status: StatusCode,
    pub content_length: String,
    pub user_agent: String,
}

impl AccessLogEntry {
    pub fn new(peer: SocketAddr, request: &ParsedRequest, status: StatusCode) -> Self {
        Self {
            peer,
            method: request.method().to_string(),
            url: request.url().to_owned(),
            http_version: request.version_str(),
            status,
            content_length: request.header_text(CONTENT_LENGTH).into_owned(),
            user_agent: request.header_text(USER_AGENT).into_owned(),
        }
    }
}

impl fmt::Display for AccessLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] \"{} {} {}\" {} {} \"{}\"",
            self.peer.ip(),
            self.peer.port(),
            self.method,
            self.url,
            self.http_version,
            self.status.as_u16(),
            self.content_length,
            self.user_agent
        )
    }
}

/// Sink for access log lines, shared by every session.
///
/// A panic in [`record`](AccessLog::record) is caught by the session and logged; the
/// connection is still shut down.
#[cfg_attr(test, mockall::automock)]
pub trait AccessLog: Send + Sync {
    fn record(&self, entry: &AccessLogEntry);
}

/// Writes each entry as an `info` event on the `cgi_http::access` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAccessLog;

impl AccessLog for TracingAccessLog {
    fn record(&self, entry: &AccessLogEntry) {
        info!(target: "cgi_http::access", "{entry}");
    }
}
