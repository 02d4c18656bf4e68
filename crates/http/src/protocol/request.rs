//! The request a session works on once parsing is complete.
//!
//! [`ParsedRequest`] wraps a `http::Request<Bytes>` so the rest of the crate can use the
//! standard accessors, and keeps the request target text the access log prints.

use std::borrow::Cow;

use bytes::Bytes;
use http::header::AsHeaderName;
use http::{HeaderMap, Method, Request, Uri, Version};

/// A fully parsed HTTP request: request line, headers and the `Content-Length` body.
///
/// Built once by the [`RequestDecoder`](crate::codec::RequestDecoder) and never mutated
/// afterwards.
#[derive(Debug)]
pub struct ParsedRequest {
    inner: Request<Bytes>,
    target: String,
}

impl AsRef<Request<Bytes>> for ParsedRequest {
    fn as_ref(&self) -> &Request<Bytes> {
        &self.inner
    }
}

impl ParsedRequest {
    /// Pairs a request with the target text exactly as it appeared on the request line.
    pub(crate) fn with_target(inner: Request<Bytes>, target: String) -> Self {
        Self { inner, target }
    }

    /// Consumes the request and returns the inner `Request<Bytes>`.
    pub fn into_inner(self) -> Request<Bytes> {
        self.inner
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// The request target as received, e.g. `/a?b=1` or `http://example.com/a?b=1`.
    pub fn url(&self) -> &str {
        &self.target
    }

    /// The path part of the target, which is what routes are matched against.
    pub fn path(&self) -> &str {
        self.inner.uri().path()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// The version the way it appears on the request line, e.g. `HTTP/1.1`.
    pub fn version_str(&self) -> &'static str {
        version_str(self.version())
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Returns the header value as text, `""` when absent.
    ///
    /// Bytes that are not valid UTF-8 are replaced with `U+FFFD`.
    pub fn header_text<K: AsHeaderName>(&self, name: K) -> Cow<'_, str> {
        self.inner.headers().get(name).map_or(Cow::Borrowed(""), |value| String::from_utf8_lossy(value.as_bytes()))
    }

    pub fn body(&self) -> &Bytes {
        self.inner.body()
    }
}

impl From<Request<Bytes>> for ParsedRequest {
    #[inline]
    fn from(inner: Request<Bytes>) -> Self {
        let target = inner.uri().to_string();
        Self { inner, target }
    }
}

pub(crate) fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}
