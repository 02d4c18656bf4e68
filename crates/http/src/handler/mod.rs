//! The seam between a session and whatever resolves requests to handlers.

use async_trait::async_trait;

use crate::protocol::{DispatchError, ParsedRequest, Payload};

/// Resolves a parsed request to a handler and runs it.
///
/// Implementations are shared by all sessions and must be safe for concurrent use; the
/// route table behind them is expected to be immutable once built. A failure is reported
/// as a [`DispatchError`] and the session answers with its fallback page.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, request: &ParsedRequest) -> Result<Payload, DispatchError>;
}
