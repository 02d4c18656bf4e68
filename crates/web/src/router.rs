use std::collections::HashMap;

use async_trait::async_trait;
use cgi_http::handler::Dispatcher;
use cgi_http::protocol::{DispatchError, ParsedRequest, Payload};
use http::Method;
use thiserror::Error;
use tracing::debug;

use crate::handler::RouteHandler;

type InnerRouter<T> = matchit::Router<T>;

/// Maps a request path and method to a [`RouteHandler`].
///
/// Matching only looks at the path, never the query string. A path that is registered
/// for other methods only is reported as not found.
pub struct Router {
    inner_router: InnerRouter<Vec<RouterItem>>,
}

pub struct RouterItem {
    method: Method,
    handler: Box<dyn RouteHandler>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Finds the handler for `method` at `path`; the first one registered wins.
    pub fn at(&self, method: &Method, path: &str) -> Option<&dyn RouteHandler> {
        let matched = match self.inner_router.at(path) {
            Ok(matched) => matched,
            Err(e) => {
                debug!(path, cause = %e, "no route matched");
                return None;
            }
        };

        matched.value.iter().find(|item| item.method == *method).map(RouterItem::handler)
    }
}

impl RouterItem {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn handler(&self) -> &dyn RouteHandler {
        self.handler.as_ref()
    }
}

#[async_trait]
impl Dispatcher for Router {
    async fn dispatch(&self, request: &ParsedRequest) -> Result<Payload, DispatchError> {
        let handler = self
            .at(request.method(), request.path())
            .ok_or_else(|| DispatchError::route_not_found(request.method().clone(), request.path()))?;

        handler.invoke().await.map_err(DispatchError::handler)
    }
}

#[derive(Error, Debug)]
pub enum RouterBuildError {
    #[error("invalid route {path}: {source}")]
    InvalidRoute {
        path: String,
        #[source]
        source: matchit::InsertError,
    },
}

pub struct RouterBuilder {
    data: HashMap<String, Vec<RouterItem>>,
}

impl RouterBuilder {
    fn new() -> Self {
        Self { data: HashMap::new() }
    }

    pub fn route(mut self, route: impl Into<String>, item: RouterItem) -> Self {
        self.data.entry(route.into()).or_default().push(item);
        self
    }

    pub fn build(self) -> Result<Router, RouterBuildError> {
        let mut inner_router = InnerRouter::new();

        for (path, items) in self.data {
            inner_router
                .insert(path.clone(), items)
                .map_err(|source| RouterBuildError::InvalidRoute { path, source })?;
        }

        Ok(Router { inner_router })
    }
}

macro_rules! method_router {
    ($method:ident, $http_method:ident) => {
        pub fn $method<H: RouteHandler + 'static>(handler: H) -> RouterItem {
            RouterItem { method: Method::$http_method, handler: Box::new(handler) }
        }
    };
}

method_router!(get, GET);
method_router!(post, POST);
method_router!(put, PUT);
method_router!(delete, DELETE);
method_router!(head, HEAD);
method_router!(options, OPTIONS);
method_router!(patch, PATCH);
