use crate::chain::{BindError, Handler, RouteBinding};
use crate::handlers;
use crate::middleware;
use crate::state::AppState;
use crate::validation::UnknownForm;
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use shared::config::Config;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Form(#[from] UnknownForm),
}

/// The users routing unit: `POST /` runs validate("register") -> register -> login
pub fn users_router(state: &AppState) -> Result<Router, RouteError> {
    let chain: Vec<Arc<dyn Handler>> = vec![
        Arc::new(handlers::validate("register")?),
        Arc::new(handlers::register(state.user_service.clone())),
        Arc::new(middleware::login(state.session_store.clone())),
    ];

    let binding = RouteBinding::post("/", chain)?.with_body_limit(state.body_limit);

    Ok(binding.into_router())
}

/// Build and configure the application router
pub fn build_router(state: AppState, config: &Config) -> Result<Router, RouteError> {
    let users = users_router(&state)?;

    let router = Router::new()
        // Health check
        .route("/health", get(handlers::health_check));

    // Nesting at the root is not allowed, merge instead
    let router = if config.users_mount == "/" {
        router.merge(users)
    } else {
        router.nest(&config.users_mount, users)
    };

    Ok(router
        // Middleware
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http()))
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
