use std::error::Error;
use std::io;
use std::time::Duration;

use http::{Method, StatusCode};
use thiserror::Error;

pub type BoxError = Box<dyn Error + Send + Sync>;

/// Why a request cycle did not go the happy way.
///
/// The first three kinds are recovered inside the session and still answered with a
/// body; the rest abort the session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FailureKind {
    RouteNotFound,
    HandlerError,
    InvalidReturnType,
    RequestTooLarge,
    MalformedRequest,
    Transport,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::RouteNotFound => "route_not_found",
            FailureKind::HandlerError => "handler_error",
            FailureKind::InvalidReturnType => "invalid_return_type",
            FailureKind::RequestTooLarge => "request_too_large",
            FailureKind::MalformedRequest => "malformed_request",
            FailureKind::Transport => "transport",
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("request error: {source}")]
    Parse {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    Send {
        #[from]
        source: SendError,
    },

    #[error("request size {current_size} exceed the limit {max_size}")]
    RequestTooLarge { current_size: usize, max_size: usize },

    #[error("peer closed the connection after {received} bytes, before a complete request")]
    ConnectionClosed { received: usize },

    #[error("{phase} timed out after {after:?}")]
    Timeout { phase: &'static str, after: Duration },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SessionError {
    pub fn request_too_large(current_size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { current_size, max_size }
    }

    pub fn timeout(phase: &'static str, after: Duration) -> Self {
        Self::Timeout { phase, after }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            SessionError::Parse { source: ParseError::TooLargeHeader { .. } | ParseError::TooManyHeaders { .. } }
            | SessionError::RequestTooLarge { .. } => FailureKind::RequestTooLarge,
            SessionError::Parse { source: ParseError::Io { .. } } => FailureKind::Transport,
            SessionError::Parse { .. } => FailureKind::MalformedRequest,
            SessionError::Send { .. }
            | SessionError::ConnectionClosed { .. }
            | SessionError::Timeout { .. }
            | SessionError::Io { .. } => FailureKind::Transport,
        }
    }

    /// The status worth telling the peer before hanging up, if the transport is still usable.
    pub fn rejection_status(&self) -> Option<StatusCode> {
        match self {
            SessionError::Parse { source: ParseError::TooLargeHeader { .. } | ParseError::TooManyHeaders { .. } } => {
                Some(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE)
            }
            SessionError::RequestTooLarge { .. } => Some(StatusCode::PAYLOAD_TOO_LARGE),
            SessionError::Parse { source: ParseError::Io { .. } } => None,
            SessionError::Parse { .. } => Some(StatusCode::BAD_REQUEST),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http uri")]
    InvalidUri,

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_response<S: ToString>(str: S) -> Self {
        Self::InvalidResponse { reason: str.to_string() }
    }
}

/// A dispatch that produced no payload. Recovered by the session with the fallback page.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("no route matches {method} {path}")]
    RouteNotFound { method: Method, path: String },

    #[error("handler failed: {source}")]
    Handler { source: BoxError },

    #[error("handler panicked: {message}")]
    Panicked { message: String },
}

impl DispatchError {
    pub fn route_not_found<S: ToString>(method: Method, path: S) -> Self {
        Self::RouteNotFound { method, path: path.to_string() }
    }

    pub fn handler<E: Into<BoxError>>(e: E) -> Self {
        Self::Handler { source: e.into() }
    }

    pub fn panicked<S: ToString>(message: S) -> Self {
        Self::Panicked { message: message.to_string() }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            DispatchError::RouteNotFound { .. } => FailureKind::RouteNotFound,
            DispatchError::Handler { .. } | DispatchError::Panicked { .. } => FailureKind::HandlerError,
        }
    }
}
