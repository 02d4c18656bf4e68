use std::time::Duration;

use http::StatusCode;

use crate::protocol::FailureKind;

/// Default number of bytes asked for per socket read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024;

/// Default cap on the bytes a session accumulates before giving up on a request.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Status codes answered for failures the session recovers from.
///
/// Every kind answers `200 OK` unless configured otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPolicy {
    pub route_not_found: StatusCode,
    pub handler_error: StatusCode,
    pub invalid_return_type: StatusCode,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self { route_not_found: StatusCode::OK, handler_error: StatusCode::OK, invalid_return_type: StatusCode::OK }
    }
}

impl StatusPolicy {
    /// Conventional statuses: `404`, `500` and `500`.
    pub fn strict() -> Self {
        Self {
            route_not_found: StatusCode::NOT_FOUND,
            handler_error: StatusCode::INTERNAL_SERVER_ERROR,
            invalid_return_type: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn status_for(&self, kind: FailureKind) -> StatusCode {
        match kind {
            FailureKind::RouteNotFound => self.route_not_found,
            FailureKind::HandlerError => self.handler_error,
            FailureKind::InvalidReturnType => self.invalid_return_type,
            FailureKind::RequestTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            FailureKind::MalformedRequest => StatusCode::BAD_REQUEST,
            FailureKind::Transport => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    read_chunk_size: usize,
    max_request_bytes: Option<usize>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    status_policy: StatusPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            max_request_bytes: Some(DEFAULT_MAX_REQUEST_BYTES),
            read_timeout: None,
            write_timeout: None,
            status_policy: StatusPolicy::default(),
        }
    }
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    pub fn read_chunk_size(&self) -> usize {
        self.read_chunk_size
    }

    pub fn max_request_bytes(&self) -> Option<usize> {
        self.max_request_bytes
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout
    }

    pub fn status_policy(&self) -> &StatusPolicy {
        &self.status_policy
    }
}

#[derive(Debug)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    fn new() -> Self {
        Self { config: SessionConfig::default() }
    }

    /// Bytes requested per read; `0` is treated as `1`.
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.config.read_chunk_size = size.max(1);
        self
    }

    /// `None` lets a request grow without bound.
    pub fn max_request_bytes(mut self, max: Option<usize>) -> Self {
        self.config.max_request_bytes = max;
        self
    }

    /// Deadline for each socket read.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = Some(timeout);
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = Some(timeout);
        self
    }

    pub fn status_policy(mut self, policy: StatusPolicy) -> Self {
        self.config.status_policy = policy;
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}
