//! Connection handling: one accepted socket, one request, one response.
//!
//! # Components
//!
//! - [`Session`]: owns the socket and peer address and drives the cycle
//!   `New → Reading → Dispatching → Responding → Logged → Closed`
//! - [`SessionContext`]: what every session shares (dispatcher, fallback page,
//!   configuration, access log)
//! - [`SessionConfig`]: read chunk size, request size cap, deadlines and the
//!   [`StatusPolicy`] for recovered failures

mod config;
mod session;

pub use config::DEFAULT_MAX_REQUEST_BYTES;
pub use config::DEFAULT_READ_CHUNK_SIZE;
pub use config::SessionConfig;
pub use config::SessionConfigBuilder;
pub use config::StatusPolicy;
pub use session::Session;
pub use session::SessionContext;
pub use session::SessionState;
