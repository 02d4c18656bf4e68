//! What a handler hands back, before it becomes a response body.
//!
//! Handlers are free to return anything implementing [`IntoPayload`]. Text and bytes turn
//! into a body directly; the other implementations record the type name so the session
//! can answer with a diagnostic instead of failing the request.

use std::any::type_name;
use std::fmt;

use bytes::Bytes;

use crate::protocol::BoxError;

#[derive(Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Bytes(Bytes),
    /// The handler returned something that is neither text nor bytes, named by its type.
    Unsupported(&'static str),
}

impl Payload {
    pub fn unsupported<T: ?Sized>() -> Self {
        Payload::Unsupported(type_name::<T>())
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            Payload::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Payload::Unsupported(type_name) => f.debug_tuple("Unsupported").field(type_name).finish(),
        }
    }
}

/// Conversion from a handler's return value into a [`Payload`].
///
/// An `Err` means the handler failed, and the session falls back to its not-found page.
pub trait IntoPayload {
    fn into_payload(self) -> Result<Payload, BoxError>;
}

impl IntoPayload for Payload {
    fn into_payload(self) -> Result<Payload, BoxError> {
        Ok(self)
    }
}

impl IntoPayload for String {
    fn into_payload(self) -> Result<Payload, BoxError> {
        Ok(Payload::Text(self))
    }
}

impl IntoPayload for &'static str {
    fn into_payload(self) -> Result<Payload, BoxError> {
        Ok(Payload::Text(self.to_owned()))
    }
}

impl IntoPayload for Bytes {
    fn into_payload(self) -> Result<Payload, BoxError> {
        Ok(Payload::Bytes(self))
    }
}

impl IntoPayload for Vec<u8> {
    fn into_payload(self) -> Result<Payload, BoxError> {
        Ok(Payload::Bytes(Bytes::from(self)))
    }
}

impl IntoPayload for &'static [u8] {
    fn into_payload(self) -> Result<Payload, BoxError> {
        Ok(Payload::Bytes(Bytes::from_static(self)))
    }
}

impl<T, E> IntoPayload for Result<T, E>
where
    T: IntoPayload,
    E: Into<BoxError>,
{
    fn into_payload(self) -> Result<Payload, BoxError> {
        self.map_err(Into::into)?.into_payload()
    }
}

/// `Some` is unwrapped; `None` has nothing to send and is reported by its type.
impl<T: IntoPayload> IntoPayload for Option<T> {
    fn into_payload(self) -> Result<Payload, BoxError> {
        match self {
            Some(t) => t.into_payload(),
            None => Ok(Payload::unsupported::<Self>()),
        }
    }
}

macro_rules! unsupported_payload {
    ($($t:ty),* $(,)?) => {
        $(
            impl IntoPayload for $t {
                fn into_payload(self) -> Result<Payload, BoxError> {
                    Ok(Payload::unsupported::<$t>())
                }
            }
        )*
    };
}

unsupported_payload!((), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_text_and_bytes() {
        assert_eq!("hi".into_payload().unwrap(), Payload::Text("hi".into()));
        assert_eq!(String::from("hi").into_payload().unwrap(), Payload::Text("hi".into()));
        assert_eq!(b"hi".to_vec().into_payload().unwrap(), Payload::Bytes(Bytes::from_static(b"hi")));
        assert_eq!((&b"hi"[..]).into_payload().unwrap(), Payload::Bytes(Bytes::from_static(b"hi")));
    }

    #[test]
    fn test_unsupported_names_the_type() {
        assert_eq!(42_i32.into_payload().unwrap(), Payload::Unsupported("i32"));
        assert_eq!(().into_payload().unwrap(), Payload::Unsupported("()"));
        assert_eq!(true.into_payload().unwrap(), Payload::Unsupported("bool"));

        let none: Option<String> = None;
        match none.into_payload().unwrap() {
            Payload::Unsupported(name) => assert!(name.contains("Option")),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_result() {
        let ok: Result<&'static str, io::Error> = Ok("hi");
        assert_eq!(ok.into_payload().unwrap(), Payload::Text("hi".into()));

        let err: Result<&'static str, io::Error> = Err(io::Error::other("boom"));
        assert_eq!(err.into_payload().unwrap_err().to_string(), "boom");
    }
}
