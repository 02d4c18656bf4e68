//! Core types shared by the codec and the session.
//!
//! - [`ParsedRequest`]: the request a session works on once the parser is done
//! - [`ResponseHead`]: response status line and headers before the body is attached
//! - [`Payload`] and [`IntoPayload`]: what handlers return
//! - Errors: [`SessionError`] for aborted sessions, [`ParseError`] and [`SendError`] for
//!   the codec, [`DispatchError`] for recovered routing and handler failures, and
//!   [`FailureKind`] to tell them apart

mod request;
pub use request::ParsedRequest;
pub(crate) use request::version_str;

mod response;
pub use response::ResponseHead;

mod payload;
pub use payload::IntoPayload;
pub use payload::Payload;

mod error;
pub use error::BoxError;
pub use error::DispatchError;
pub use error::FailureKind;
pub use error::ParseError;
pub use error::SendError;
pub use error::SessionError;
