use std::any::Any;
use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use futures::FutureExt;
use http::{HeaderMap, StatusCode, Version};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_util::codec::Decoder;
use tracing::{debug, trace, warn};

use crate::access_log::{AccessLog, AccessLogEntry, TracingAccessLog};
use crate::codec::{RequestDecoder, make_response};
use crate::connection::SessionConfig;
use crate::ensure;
use crate::fallback::FallbackPage;
use crate::handler::Dispatcher;
use crate::protocol::{DispatchError, FailureKind, ParsedRequest, Payload, SessionError};

/// Where a [`Session`] is in its single request/response cycle.
///
/// States only move forward; `Closed` is reachable from any state and is terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    New,
    Reading,
    Dispatching,
    Responding,
    Logged,
    Closed,
}

/// Everything sessions share: the dispatcher (route table), the fallback page, the
/// configuration and the access log sink. Built once at startup.
pub struct SessionContext {
    dispatcher: Arc<dyn Dispatcher>,
    fallback: FallbackPage,
    config: SessionConfig,
    access_log: Arc<dyn AccessLog>,
}

impl SessionContext {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            dispatcher,
            fallback: FallbackPage::default(),
            config: SessionConfig::default(),
            access_log: Arc::new(TracingAccessLog),
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackPage) -> Self {
        self.fallback = fallback;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_access_log(mut self, access_log: Arc<dyn AccessLog>) -> Self {
        self.access_log = access_log;
        self
    }

    pub fn dispatcher(&self) -> &dyn Dispatcher {
        self.dispatcher.as_ref()
    }

    pub fn fallback(&self) -> &FallbackPage {
        &self.fallback
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn access_log(&self) -> &dyn AccessLog {
        self.access_log.as_ref()
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext").field("fallback", &self.fallback).field("config", &self.config).finish_non_exhaustive()
    }
}

/// One accepted connection, driven through exactly one request/response cycle.
///
/// `Session` handles:
/// - Reading the socket in bounded chunks until the request is complete
/// - Dispatching the request and turning the outcome into a body
/// - Writing the response once and recording one access log line
/// - Shutting the socket down on every path, success or failure
///
/// # Type Parameters
///
/// * `S`: the connection, readable and writable
pub struct Session<S> {
    stream: S,
    peer: SocketAddr,
    state: SessionState,
}

impl<S> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("peer", &self.peer).field("state", &self.state).finish_non_exhaustive()
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: SocketAddr) -> Self {
        Self { stream, peer, state: SessionState::New }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the cycle and closes the connection.
    ///
    /// Returns the status sent for a completed cycle. Routing and handler failures are
    /// answered with the fallback page and still count as completed. An `Err` means the
    /// session was aborted (transport failure, timeout, oversized or malformed request);
    /// the socket is closed in that case too.
    pub async fn run(mut self, ctx: &SessionContext) -> Result<StatusCode, SessionError> {
        let result = self.process(ctx).await;
        self.close(ctx.config()).await;
        result
    }

    async fn process(&mut self, ctx: &SessionContext) -> Result<StatusCode, SessionError> {
        let config = ctx.config();
        let request = match self.read_request(config).await {
            Ok(request) => request,
            Err(e) => {
                self.reject(&e, config).await;
                return Err(e);
            }
        };

        self.advance(SessionState::Dispatching);
        let (status, body) = self.dispatch(&request, ctx).await;

        self.advance(SessionState::Responding);
        let response = make_response(status, request.version(), request.headers(), body)?;
        self.write_response(&response, config).await?;

        self.advance(SessionState::Logged);
        self.record_access(&request, status, ctx.access_log());
        Ok(status)
    }

    async fn read_request(&mut self, config: &SessionConfig) -> Result<ParsedRequest, SessionError> {
        self.advance(SessionState::Reading);

        let chunk_size = config.read_chunk_size();
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::with_capacity(chunk_size);

        loop {
            buf.reserve(chunk_size);
            let mut chunk = (&mut buf).limit(chunk_size);
            let read = with_deadline("read", config.read_timeout(), self.stream.read_buf(&mut chunk)).await?;
            if read == 0 {
                return Err(SessionError::ConnectionClosed { received: buf.len() });
            }
            trace!(peer = %self.peer, read, buffered = buf.len(), "received request bytes");

            if let Some(max) = config.max_request_bytes() {
                ensure!(buf.len() <= max, SessionError::request_too_large(buf.len(), max));
            }

            if let Some(request) = decoder.decode(&mut buf)? {
                debug!(peer = %self.peer, method = %request.method(), url = request.url(), "parsed request");
                return Ok(request);
            }
        }
    }

    async fn dispatch(&self, request: &ParsedRequest, ctx: &SessionContext) -> (StatusCode, Bytes) {
        let policy = ctx.config().status_policy();

        let result = AssertUnwindSafe(ctx.dispatcher().dispatch(request))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(DispatchError::panicked(panic_message(&*panic))));

        match result {
            Ok(Payload::Text(text)) => (StatusCode::OK, Bytes::from(text)),
            Ok(Payload::Bytes(bytes)) => (StatusCode::OK, bytes),
            Ok(Payload::Unsupported(type_name)) => {
                let kind = FailureKind::InvalidReturnType;
                warn!(peer = %self.peer, kind = kind.as_str(), type_name, "handler returned neither text nor bytes");
                (policy.status_for(kind), Bytes::from(unsupported_body(type_name)))
            }
            Err(e) => {
                warn!(peer = %self.peer, kind = e.kind().as_str(), cause = %e, "dispatch failed, answering with the fallback page");
                (policy.status_for(e.kind()), ctx.fallback().body())
            }
        }
    }

    fn record_access(&self, request: &ParsedRequest, status: StatusCode, access_log: &dyn AccessLog) {
        let entry = AccessLogEntry::new(self.peer, request, status);
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| access_log.record(&entry))) {
            warn!(peer = %self.peer, cause = %panic_message(&*payload), "access log panicked, line dropped: {entry}");
        }
    }

    /// Tells the peer why its request was refused, when the connection is still usable.
    async fn reject(&mut self, error: &SessionError, config: &SessionConfig) {
        let Some(status) = error.rejection_status() else {
            return;
        };
        warn!(peer = %self.peer, kind = error.kind().as_str(), cause = %error, %status, "rejecting request");

        let result = match make_response(status, Version::HTTP_11, &HeaderMap::new(), Bytes::new()) {
            Ok(response) => self.write_response(&response, config).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            debug!(peer = %self.peer, cause = %e, "can't send rejection response");
        }
    }

    async fn write_response(&mut self, response: &[u8], config: &SessionConfig) -> Result<(), SessionError> {
        self.advance(SessionState::Responding);
        let stream = &mut self.stream;
        with_deadline("write", config.write_timeout(), async move {
            stream.write_all(response).await?;
            stream.flush().await
        })
        .await
    }

    async fn close(&mut self, config: &SessionConfig) {
        if self.state == SessionState::Closed {
            return;
        }
        if let Err(e) = with_deadline("shutdown", config.write_timeout(), self.stream.shutdown()).await {
            debug!(peer = %self.peer, cause = %e, "shutdown connection error");
        }
        self.advance(SessionState::Closed);
    }

    fn advance(&mut self, next: SessionState) {
        debug_assert!(next >= self.state, "session state can't go back from {:?} to {next:?}", self.state);
        trace!(peer = %self.peer, from = ?self.state, to = ?next, "session state");
        self.state = next;
    }
}

async fn with_deadline<F, T>(phase: &'static str, deadline: Option<Duration>, fut: F) -> Result<T, SessionError>
where
    F: Future<Output = io::Result<T>>,
{
    match deadline {
        Some(after) => timeout(after, fut).await.map_err(|_elapsed| SessionError::timeout(phase, after))?.map_err(Into::into),
        None => fut.await.map_err(Into::into),
    }
}

fn unsupported_body(type_name: &str) -> String {
    format!("<P> currently does not support {type_name} as the return value of the handler</P>")
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
