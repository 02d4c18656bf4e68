//! HTTP response serialization
//!
//! [`ResponseEncoder`] writes a status line, the response headers and the whole body in
//! one go, since a session sends exactly one response and never streams.
//! [`make_response`] derives the response head from the request it answers and runs the
//! encoder over it.

use std::io;
use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};
use http::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, DATE};
use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode, Version};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::protocol::{ResponseHead, SendError, version_str};

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Correlation header copied from the request onto the response.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const CONNECTION_CLOSE: HeaderValue = HeaderValue::from_static("close");

#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<(ResponseHead, Bytes)> for ResponseEncoder {
    type Error = SendError;

    /// Encodes the head and body, overriding any `Content-Length` with the body size.
    fn encode(&mut self, item: (ResponseHead, Bytes), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (mut head, body) = item;

        dst.reserve(INIT_HEADER_SIZE + body.len());
        match head.version() {
            v @ (Version::HTTP_10 | Version::HTTP_11) => {
                write!(
                    FastWrite(dst),
                    "{} {} {}\r\n",
                    version_str(v),
                    head.status().as_str(),
                    head.status().canonical_reason().unwrap_or_default()
                )?;
            }
            v => {
                error!(http_version = ?v, "unsupported http version");
                return Err(io::Error::from(io::ErrorKind::Unsupported).into());
            }
        }

        head.headers_mut().insert(CONTENT_LENGTH, body.len().into());

        for (header_name, header_value) in head.headers() {
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        dst.put_slice(&body);
        Ok(())
    }
}

/// Serializes a complete response to the request described by `version` and `request_headers`.
///
/// The status line follows the request's version. The head carries `Content-Type`
/// (html), `Content-Length`, `Date`, `Connection: close`, and the request's
/// `X-Request-Id` when it sent one.
pub fn make_response(
    status: StatusCode,
    version: Version,
    request_headers: &HeaderMap,
    body: impl Into<Bytes>,
) -> Result<Bytes, SendError> {
    let version = if version == Version::HTTP_10 { Version::HTTP_10 } else { Version::HTTP_11 };

    let mut head = Response::new(());
    *head.status_mut() = status;
    *head.version_mut() = version;

    let headers = head.headers_mut();
    headers.reserve(8);
    let content_type = HeaderValue::from_str(mime::TEXT_HTML_UTF_8.as_ref()).map_err(SendError::invalid_response)?;
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(DATE, http_date()?);
    headers.insert(CONNECTION, CONNECTION_CLOSE);
    if let Some(request_id) = request_headers.get(X_REQUEST_ID) {
        headers.insert(X_REQUEST_ID, request_id.clone());
    }

    let mut dst = BytesMut::new();
    ResponseEncoder.encode((head, body.into()), &mut dst)?;
    Ok(dst.freeze())
}

fn http_date() -> Result<HeaderValue, SendError> {
    let mut buf = faf_http_date::get_date_buff_no_key();
    faf_http_date::get_date_no_key(&mut buf);
    HeaderValue::from_bytes(&buf).map_err(SendError::invalid_response)
}

/// Fast writer implementation for writing to BytesMut.
///
/// Space has been reserved up front, so writes never fail.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
