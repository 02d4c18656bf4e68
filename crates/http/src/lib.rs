//! A single HTTP connection, handled end to end
//!
//! This crate takes one accepted connection through exactly one request/response cycle:
//! it reads the socket until a complete request has been parsed, dispatches the request
//! to a handler, turns the handler's result into a response, writes it, records one
//! access log line and closes the socket.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use cgi_http::connection::{Session, SessionContext};
//! use cgi_http::handler::Dispatcher;
//! use cgi_http::protocol::{DispatchError, ParsedRequest, Payload};
//! use tokio::net::TcpListener;
//! use tracing::{info, warn};
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Dispatcher for Hello {
//!     async fn dispatch(&self, request: &ParsedRequest) -> Result<Payload, DispatchError> {
//!         match request.path() {
//!             "/hello" => Ok(Payload::Text("hi".into())),
//!             path => Err(DispatchError::route_not_found(request.method().clone(), path)),
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let ctx = Arc::new(SessionContext::new(Arc::new(Hello)));
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     loop {
//!         let (stream, peer) = listener.accept().await?;
//!         let ctx = Arc::clone(&ctx);
//!         tokio::spawn(async move {
//!             match Session::new(stream, peer).run(&ctx).await {
//!                 Ok(status) => info!(%peer, %status, "session finished"),
//!                 Err(e) => warn!(%peer, cause = %e, "session aborted"),
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`connection`]: the [`Session`](connection::Session) and its configuration
//! - [`codec`]: request parsing and response serialization
//! - [`protocol`]: request, payload and error types
//! - [`handler`]: the [`Dispatcher`](handler::Dispatcher) seam routers implement
//! - [`access_log`]: the per-request log line
//! - [`fallback`]: the page served when routing or a handler fails
//!
//! # Error Handling
//!
//! - [`protocol::DispatchError`]: routing and handler failures, recovered with the fallback page
//! - [`protocol::SessionError`]: failures that abort a session (transport, timeout,
//!   oversized or malformed requests)
//! - [`protocol::FailureKind`]: one name per failure cause, for logs and status policy
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 only, no keep-alive: one request per connection
//! - No TLS support (use a reverse proxy for HTTPS)
//! - Request bodies are buffered, and only delimited by `Content-Length`
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64

pub mod access_log;
pub mod codec;
pub mod connection;
pub mod fallback;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
