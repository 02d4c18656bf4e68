//! A small routing layer and TCP server on top of `cgi-http`.
//!
//! Routes map a path and a method to a zero-argument async handler. Every accepted
//! connection runs as one [`Session`](cgi_http::connection::Session): one request, one
//! response, one access log line, then the socket is closed.
//!
//! ```no_run
//! use cgi_web::router::{Router, get};
//! use cgi_web::{Server, handler_fn};
//!
//! async fn hello() -> &'static str {
//!     "hello world"
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::builder().route("/hello", get(handler_fn(hello))).build()?;
//!
//!     Server::builder().router(router).bind("127.0.0.1:8080").build()?.start().await;
//!     Ok(())
//! }
//! ```

mod handler;
mod server;

pub mod router;

pub use handler::FnHandler;
pub use handler::RouteHandler;
pub use handler::handler_fn;
pub use router::Router;
pub use server::DEFAULT_FALLBACK_PATH;
pub use server::Server;
pub use server::ServerBuildError;
pub use server::ServerBuilder;
