//! HTTP response header handling.
//!
//! A response is assembled as a head (`http::Response<()>`) plus the body bytes, and only
//! lives until the encoder has written it out.

use http::Response;

/// Type alias for HTTP response headers.
///
/// This type represents the header portion of an HTTP response, using
/// `http::Response<()>` with an empty body placeholder.
pub type ResponseHead = Response<()>;
