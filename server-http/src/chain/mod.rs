//! Ordered handler chains bound to a single route.
//!
//! A [`RouteBinding`] associates a method and path with a non-empty list of
//! [`Handler`]s. Matching requests run through the handlers strictly in order;
//! each one either hands over to the next ([`Flow::Next`]) or ends the exchange
//! with a response or a [`HandlerError`].

mod binding;
mod context;

pub use binding::{BindError, HandlerChain, RouteBinding, DEFAULT_BODY_LIMIT};
pub use context::RequestContext;

use crate::error::HandlerError;
use async_trait::async_trait;
use axum::response::Response;

/// Outcome of a handler that did not fail
#[derive(Debug)]
pub enum Flow {
    /// Delegate to the next handler in the chain
    Next,
    /// Terminate the chain with this response
    Respond(Response),
}

/// One step of a route's handler chain
#[async_trait]
pub trait Handler: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    async fn handle(&self, ctx: &mut RequestContext) -> Result<Flow, HandlerError>;
}
