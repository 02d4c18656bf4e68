use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;

use cgi_http::access_log::AccessLog;
use cgi_http::connection::{Session, SessionConfig, SessionContext};
use cgi_http::fallback::FallbackPage;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::router::Router;

pub const DEFAULT_FALLBACK_PATH: &str = "static/404.html";

pub struct ServerBuilder {
    router: Option<Router>,
    address: Option<io::Result<Vec<SocketAddr>>>,
    fallback_path: PathBuf,
    session_config: SessionConfig,
    access_log: Option<Arc<dyn AccessLog>>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self {
            router: None,
            address: None,
            fallback_path: PathBuf::from(DEFAULT_FALLBACK_PATH),
            session_config: SessionConfig::default(),
            access_log: None,
        }
    }

    pub fn bind<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(|addrs| addrs.collect()));
        self
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// The html page served when no route matches or a handler fails.
    pub fn fallback_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback_path = path.into();
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn access_log(mut self, access_log: impl AccessLog + 'static) -> Self {
        self.access_log = Some(Arc::new(access_log));
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let router = self.router.ok_or(ServerBuildError::MissingRouter)?;
        let address = self.address.ok_or(ServerBuildError::MissingAddress)?.map_err(ServerBuildError::InvalidAddress)?;
        if address.is_empty() {
            return Err(ServerBuildError::MissingAddress);
        }

        Ok(Server {
            router,
            address,
            fallback_path: self.fallback_path,
            session_config: self.session_config,
            access_log: self.access_log,
        })
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("router must be set")]
    MissingRouter,
    #[error("address must be set")]
    MissingAddress,
    #[error("address can't be resolved: {0}")]
    InvalidAddress(#[source] io::Error),
}

pub struct Server {
    router: Router,
    address: Vec<SocketAddr>,
    fallback_path: PathBuf,
    session_config: SessionConfig,
    access_log: Option<Arc<dyn AccessLog>>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn address(&self) -> &[SocketAddr] {
        &self.address
    }

    /// Installs the log subscriber, binds the configured address and serves forever.
    pub async fn start(self) {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            warn!(cause = %e, "keeping the already installed subscriber");
        }

        info!("start listening at {:?}", self.address);
        let tcp_listener = match TcpListener::bind(self.address.as_slice()).await {
            Ok(tcp_listener) => tcp_listener,
            Err(e) => {
                error!(cause = %e, "bind server error");
                return;
            }
        };

        self.serve(tcp_listener).await;
    }

    /// Accepts connections from `tcp_listener`, one session per connection.
    ///
    /// The fallback page is read once, before the first connection is accepted.
    pub async fn serve(self, tcp_listener: TcpListener) {
        let fallback = FallbackPage::load(&self.fallback_path);
        let mut ctx = SessionContext::new(Arc::new(self.router)).with_fallback(fallback).with_config(self.session_config);
        if let Some(access_log) = self.access_log {
            ctx = ctx.with_access_log(access_log);
        }
        let ctx = Arc::new(ctx);

        loop {
            let (tcp_stream, peer) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let ctx = Arc::clone(&ctx);

            tokio::spawn(async move {
                match Session::new(tcp_stream, peer).run(&ctx).await {
                    Ok(status) => {
                        debug!(%peer, %status, "finished session, connection shutdown");
                    }
                    Err(e) => {
                        warn!(%peer, kind = e.kind().as_str(), cause = %e, "session aborted, connection shutdown");
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use crate::router::get;

    async fn hello() -> &'static str {
        "hello"
    }

    fn router() -> Router {
        Router::builder().route("/", get(handler_fn(hello))).build().unwrap()
    }

    #[test]
    fn test_missing_router() {
        let result = Server::builder().bind("127.0.0.1:0").build();
        assert!(matches!(result, Err(ServerBuildError::MissingRouter)));
    }

    #[test]
    fn test_missing_address() {
        let result = Server::builder().router(router()).build();
        assert!(matches!(result, Err(ServerBuildError::MissingAddress)));
    }

    #[test]
    fn test_invalid_address() {
        let result = Server::builder().router(router()).bind("not an address").build();
        assert!(matches!(result, Err(ServerBuildError::InvalidAddress(_))));
    }

    #[test]
    fn test_build() {
        let server = Server::builder().router(router()).bind("127.0.0.1:3000").build().unwrap();
        assert_eq!(server.address(), &["127.0.0.1:3000".parse::<SocketAddr>().unwrap()]);
    }
}
