//! HTTP request decoder
//!
//! [`RequestDecoder`] turns the bytes a session has accumulated so far into a
//! [`ParsedRequest`]. It is called again with a longer buffer after every read, and it
//! leaves the buffer untouched until a whole request (head plus `Content-Length` body) is
//! available, so it never carries partial state from one call to the next.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum header size: 8KB
//! - HTTP/1.0 and HTTP/1.1 only
//! - No `Transfer-Encoding` on requests
//!
//! # Example
//!
//! ```no_run
//! use cgi_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: a\r\n\r\n"[..]);
//! let request = decoder.decode(&mut buffer);
//! ```

use std::mem::MaybeUninit;

use bytes::BytesMut;
use http::{HeaderName, HeaderValue, Method, Request, Uri, Version};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{ParseError, ParsedRequest};

/// Maximum number of headers allowed in a request
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire header section
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Stateless decoder for a complete HTTP request.
///
/// - `Ok(None)`: the buffer does not hold a whole request yet, read more
/// - `Ok(Some(request))`: the request bytes have been split off the buffer
/// - `Err(_)`: the bytes can never become a valid request
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestDecoder;

impl RequestDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for RequestDecoder {
    type Item = ParsedRequest;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Minimum valid HTTP request needs at least "GET / HTTP/1.1\n\n"
        if src.len() < 14 {
            return Ok(None);
        }

        let mut req = httparse::Request::new(&mut []);
        let mut headers = [const { MaybeUninit::<httparse::Header<'_>>::uninit() }; MAX_HEADER_NUM];

        let parsed_result = req.parse_with_uninit_headers(src, &mut headers).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            e => ParseError::invalid_header(e.to_string()),
        });

        let head_len = match parsed_result? {
            Status::Complete(head_len) => head_len,
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                return Ok(None);
            }
        };

        trace!(head_size = head_len, "parsed request head");
        ensure!(head_len <= MAX_HEADER_BYTES, ParseError::too_large_header(head_len, MAX_HEADER_BYTES));

        let body_len = body_length(req.headers)?;
        let total_len = head_len.checked_add(body_len).ok_or_else(|| ParseError::invalid_content_length("overflow"))?;
        if src.len() < total_len {
            trace!(received = src.len(), expected = total_len, "waiting for request body");
            return Ok(None);
        }

        let version = match req.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            // Currently HTTP/2 and HTTP/3 not supported
            _ => return Err(ParseError::InvalidVersion(req.version)),
        };
        let method = req.method.ok_or(ParseError::InvalidMethod)?;
        let method = Method::from_bytes(method.as_bytes()).map_err(|_e| ParseError::InvalidMethod)?;
        let target = req.path.ok_or(ParseError::InvalidUri)?;
        let uri = Uri::try_from(target).map_err(|_e| ParseError::InvalidUri)?;
        let target = target.to_owned();

        let header_count = req.headers.len();
        let mut header_index: [HeaderIndex; MAX_HEADER_NUM] = EMPTY_HEADER_INDEX_ARRAY;
        HeaderIndex::record(src, req.headers, &mut header_index);

        let head_bytes = src.split_to(head_len).freeze();
        let body = src.split_to(body_len).freeze();

        let mut request = Request::new(body);
        *request.method_mut() = method;
        *request.uri_mut() = uri;
        *request.version_mut() = version;

        let headers = request.headers_mut();
        headers.reserve(header_count);
        for index in &header_index[..header_count] {
            let name = HeaderName::from_bytes(&head_bytes[index.name.0..index.name.1]).map_err(ParseError::invalid_header)?;
            let value = HeaderValue::from_maybe_shared(head_bytes.slice(index.value.0..index.value.1))
                .map_err(ParseError::invalid_header)?;
            headers.append(name, value);
        }

        Ok(Some(ParsedRequest::with_target(request, target)))
    }
}

/// Reads the body length off the raw headers, `0` when there is no `Content-Length`.
fn body_length(headers: &[httparse::Header<'_>]) -> Result<usize, ParseError> {
    ensure!(
        !headers.iter().any(|h| h.name.eq_ignore_ascii_case(http::header::TRANSFER_ENCODING.as_str())),
        ParseError::invalid_body("transfer-encoding is not supported on requests")
    );

    let Some(header) = headers.iter().find(|h| h.name.eq_ignore_ascii_case(http::header::CONTENT_LENGTH.as_str())) else {
        return Ok(0);
    };

    let cl_str = std::str::from_utf8(header.value)
        .map_err(|_e| ParseError::invalid_content_length("value should be encoded as ascii string"))?;

    cl_str.trim().parse::<usize>().map_err(|_e| ParseError::invalid_content_length(format!("value {cl_str} is not usize")))
}

/// Stores the byte range positions of a header's name and value within the original buffer.
#[derive(Clone, Copy)]
struct HeaderIndex {
    name: (usize, usize),
    value: (usize, usize),
}

const EMPTY_HEADER_INDEX: HeaderIndex = HeaderIndex { name: (0, 0), value: (0, 0) };

const EMPTY_HEADER_INDEX_ARRAY: [HeaderIndex; MAX_HEADER_NUM] = [EMPTY_HEADER_INDEX; MAX_HEADER_NUM];

impl HeaderIndex {
    /// Records where each parsed header name and value sits inside `bytes`.
    fn record(bytes: &[u8], headers: &[httparse::Header<'_>], indices: &mut [HeaderIndex]) {
        let bytes_ptr = bytes.as_ptr() as usize;
        for (header, indices) in headers.iter().zip(indices.iter_mut()) {
            let name_start = header.name.as_ptr() as usize - bytes_ptr;
            let name_end = name_start + header.name.len();
            indices.name = (name_start, name_end);
            let value_start = header.value.as_ptr() as usize - bytes_ptr;
            let value_end = value_start + header.value.len();
            indices.value = (value_start, value_end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{ACCEPT, CONTENT_LENGTH, HOST, USER_AGENT};
    use indoc::indoc;

    const HELLO: &str = "GET /hello HTTP/1.1\r\nUser-Agent: t\r\nContent-Length: 0\r\n\r\n";

    #[test]
    fn from_curl() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##};

        let mut buf = BytesMut::from(str);

        let request = RequestDecoder.decode(&mut buf).unwrap().unwrap();

        assert!(buf.is_empty());
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.version(), Version::HTTP_11);
        assert_eq!(request.uri().host(), None);
        assert_eq!(request.path(), "/index.html");
        assert_eq!(request.uri().query(), None);
        assert!(request.body().is_empty());

        assert_eq!(request.headers().len(), 3);
        assert_eq!(request.headers().get(ACCEPT), Some(&HeaderValue::from_str("*/*").unwrap()));
        assert_eq!(request.headers().get(HOST), Some(&HeaderValue::from_str("127.0.0.1:8080").unwrap()));
        assert_eq!(request.headers().get(USER_AGENT), Some(&HeaderValue::from_str("curl/7.79.1").unwrap()));
    }

    #[test]
    fn test_partial_head_keeps_buffer() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::new();

        for (i, byte) in HELLO.as_bytes()[..HELLO.len() - 1].iter().enumerate() {
            buf.extend_from_slice(&[*byte]);
            assert!(decoder.decode(&mut buf).unwrap().is_none());
            assert_eq!(buf.len(), i + 1);
        }

        buf.extend_from_slice(b"\n");
        let request = decoder.decode(&mut buf).unwrap().unwrap();
        assert!(buf.is_empty());
        assert_eq!(request.url(), "/hello");
        assert_eq!(request.header_text(USER_AGENT), "t");
        assert_eq!(request.header_text(CONTENT_LENGTH), "0");
    }

    #[test]
    fn test_waits_for_body() {
        let head = indoc! {r##"
        POST /submit?x=1 HTTP/1.0
        Content-Length: 10

        "##};

        let mut buf = BytesMut::from(head);
        buf.extend_from_slice(b"01234");
        assert!(RequestDecoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), head.len() + 5);

        buf.extend_from_slice(b"56789tail");
        let request = RequestDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.version(), Version::HTTP_10);
        assert_eq!(request.url(), "/submit?x=1");
        assert_eq!(&request.body()[..], b"0123456789");
        assert_eq!(&buf[..], b"tail");
    }

    #[test]
    fn test_transfer_encoding_rejected() {
        let str = indoc! {r##"
        POST / HTTP/1.1
        Transfer-Encoding: chunked

        "##};

        let mut buf = BytesMut::from(str);
        let result = RequestDecoder.decode(&mut buf);
        assert!(matches!(result, Err(ParseError::InvalidBody { .. })));
    }

    #[test]
    fn test_invalid_content_length() {
        let str = indoc! {r##"
        POST / HTTP/1.1
        Content-Length: ten

        "##};

        let mut buf = BytesMut::from(str);
        let result = RequestDecoder.decode(&mut buf);
        assert!(matches!(result, Err(ParseError::InvalidContentLength { .. })));
    }

    #[test]
    fn test_too_large_header() {
        let mut buf = BytesMut::from("GET / HTTP/1.1\r\nX-Filler: ");
        buf.extend_from_slice(&[b'a'; MAX_HEADER_BYTES]);

        let result = RequestDecoder.decode(&mut buf);
        assert!(matches!(result, Err(ParseError::TooLargeHeader { max_size: MAX_HEADER_BYTES, .. })));
    }

    #[test]
    fn test_too_many_headers() {
        let mut buf = BytesMut::from("GET / HTTP/1.1\r\n");
        for i in 0..=MAX_HEADER_NUM {
            buf.extend_from_slice(format!("X-H{i}: v\r\n").as_bytes());
        }
        buf.extend_from_slice(b"\r\n");

        let result = RequestDecoder.decode(&mut buf);
        assert!(matches!(result, Err(ParseError::TooManyHeaders { max_num: MAX_HEADER_NUM })));
    }

    #[test]
    fn test_absolute_form_target_and_non_ascii_header() {
        let mut buf = BytesMut::from(&b"GET http://example.com/a?b=1 HTTP/1.1\r\nUser-Agent: caf\xc3\xa9-client/1.0\r\n\r\n"[..]);

        let request = RequestDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(request.url(), "http://example.com/a?b=1");
        assert_eq!(request.path(), "/a");
        assert_eq!(request.uri().host(), Some("example.com"));
        assert_eq!(request.header_text(USER_AGENT), "café-client/1.0");
    }

    #[test]
    fn test_garbage() {
        let mut buf = BytesMut::from("\x01\x02 not http at all\r\n\r\n");
        assert!(RequestDecoder.decode(&mut buf).is_err());
    }
}
