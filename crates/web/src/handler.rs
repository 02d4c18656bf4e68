use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use cgi_http::protocol::{BoxError, IntoPayload, Payload};

/// A route endpoint: takes no arguments and produces a payload.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn invoke(&self) -> Result<Payload, BoxError>;
}

/// Wraps any zero-argument async fn whose output implements [`IntoPayload`].
pub struct FnHandler<F, Fut> {
    f: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnHandler<F, Fut>
where
    F: Fn() -> Fut,
    Fut: Future,
{
    fn new(f: F) -> Self {
        Self { f, _phantom: PhantomData }
    }
}

pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F, Fut>
where
    F: Fn() -> Fut,
    Fut: Future,
    Fut::Output: IntoPayload,
{
    FnHandler::new(f)
}

#[async_trait]
impl<F, Fut> RouteHandler for FnHandler<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future + Send,
    Fut::Output: IntoPayload,
{
    async fn invoke(&self) -> Result<Payload, BoxError> {
        (self.f)().await.into_payload()
    }
}

#[cfg(test)]
mod test {
    use std::io;

    use super::*;

    fn assert_is_handler<T: RouteHandler>(_handler: &T) {
        // no op
    }

    #[tokio::test]
    async fn test_text_handler() {
        async fn hello() -> &'static str {
            "hi"
        }

        let handler = handler_fn(hello);
        assert_is_handler(&handler);
        assert_eq!(handler.invoke().await.unwrap(), Payload::Text("hi".into()));
    }

    #[tokio::test]
    async fn test_unsupported_handler() {
        async fn answer() -> u64 {
            42
        }

        let handler = handler_fn(answer);
        assert_eq!(handler.invoke().await.unwrap(), Payload::Unsupported("u64"));
    }

    #[tokio::test]
    async fn test_failing_handler() {
        async fn broken() -> Result<String, io::Error> {
            Err(io::Error::other("disk on fire"))
        }

        let handler = handler_fn(broken);
        assert_eq!(handler.invoke().await.unwrap_err().to_string(), "disk on fire");
    }

    #[tokio::test]
    async fn test_closure_handler() {
        let greeting = String::from("hey");
        let handler = handler_fn(move || {
            let greeting = greeting.clone();
            async move { greeting }
        });

        assert_eq!(handler.invoke().await.unwrap(), Payload::Text("hey".into()));
    }
}
