use super::{Flow, Handler, RequestContext};
use crate::error::HandlerError;
use axum::{
    extract::Request,
    http::Method,
    response::{IntoResponse, Response},
    routing::{on, MethodFilter},
    Router,
};
use std::sync::Arc;
use thiserror::Error;

/// Bodies larger than this are rejected unless a binding overrides it
pub const DEFAULT_BODY_LIMIT: usize = 16 * 1024;

#[derive(Debug, Error)]
pub enum BindError {
    #[error("Route {method} {path} has an empty handler chain")]
    EmptyChain { method: Method, path: String },

    #[error("Method {0} cannot be routed")]
    UnsupportedMethod(Method),

    #[error("Path pattern '{0}' must start with '/'")]
    InvalidPath(String),
}

/// Immutable, ordered list of handlers shared by every request on a route
#[derive(Clone)]
pub struct HandlerChain {
    handlers: Arc<[Arc<dyn Handler>]>,
}

impl HandlerChain {
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Run the handlers in order until one responds or fails
    pub async fn run(&self, mut ctx: RequestContext) -> Response {
        for handler in self.handlers.iter() {
            match handler.handle(&mut ctx).await {
                Ok(Flow::Next) => continue,
                Ok(Flow::Respond(response)) => return response,
                Err(err) => return err.into_response(),
            }
        }

        HandlerError::ChainExhausted.into_response()
    }

    async fn dispatch(&self, request: Request, body_limit: usize) -> Response {
        match RequestContext::from_request(request, body_limit).await {
            Ok(ctx) => self.run(ctx).await,
            Err(err) => err.into_response(),
        }
    }
}

/// A method + path pattern bound to a handler chain.
///
/// Built once at startup and consumed by [`RouteBinding::into_router`], so a
/// binding is mounted at most once.
pub struct RouteBinding {
    filter: MethodFilter,
    path: String,
    chain: HandlerChain,
    body_limit: usize,
}

impl RouteBinding {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        handlers: Vec<Arc<dyn Handler>>,
    ) -> Result<Self, BindError> {
        let path = path.into();

        if !path.starts_with('/') {
            return Err(BindError::InvalidPath(path));
        }

        if handlers.is_empty() {
            return Err(BindError::EmptyChain { method, path });
        }

        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| BindError::UnsupportedMethod(method.clone()))?;

        Ok(Self {
            filter,
            path,
            chain: HandlerChain {
                handlers: handlers.into(),
            },
            body_limit: DEFAULT_BODY_LIMIT,
        })
    }

    pub fn post(path: impl Into<String>, handlers: Vec<Arc<dyn Handler>>) -> Result<Self, BindError> {
        Self::new(Method::POST, path, handlers)
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    pub fn chain(&self) -> &HandlerChain {
        &self.chain
    }

    /// Produce a routing unit that a parent router can nest or merge
    pub fn into_router<S>(self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let chain = self.chain;
        let body_limit = self.body_limit;

        Router::new().route(
            &self.path,
            on(self.filter, move |request: Request| {
                let chain = chain.clone();
                async move { chain.dispatch(request, body_limit).await }
            }),
        )
    }
}
