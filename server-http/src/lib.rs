pub mod api;
pub mod chain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod validation;

// Re-export key types
pub use chain::{Flow, Handler, RequestContext, RouteBinding};
pub use error::HandlerError;
pub use routes::{build_router, users_router};
pub use state::AppState;
