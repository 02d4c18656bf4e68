//! Wire encoding and decoding for a single request/response exchange.
//!
//! - [`RequestDecoder`]: accumulated bytes in, [`ParsedRequest`](crate::protocol::ParsedRequest) out
//! - [`ResponseEncoder`] and [`make_response`]: status, headers and body in, wire bytes out
//!
//! Both plug into `tokio_util::codec`, so they can also be driven by `FramedRead` and
//! `FramedWrite` when needed.

mod request_decoder;
mod response_encoder;

pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
pub use response_encoder::X_REQUEST_ID;
pub use response_encoder::make_response;
