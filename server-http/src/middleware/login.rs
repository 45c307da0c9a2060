use crate::api::RegisterResponse;
use crate::chain::{Flow, Handler, RequestContext};
use crate::error::HandlerError;
use async_trait::async_trait;
use axum::{http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;
use turnstile::auth::{SessionStore, User};

pub fn login(session_store: Arc<SessionStore>) -> LoginHandler {
    LoginHandler { session_store }
}

/// Issues a session for the user created earlier in the chain and writes
/// the final response
pub struct LoginHandler {
    session_store: Arc<SessionStore>,
}

#[async_trait]
impl Handler for LoginHandler {
    fn name(&self) -> &'static str {
        "login"
    }

    async fn handle(&self, ctx: &mut RequestContext) -> Result<Flow, HandlerError> {
        let user = ctx.take::<User>().ok_or(HandlerError::MissingContext {
            handler: "login",
            missing: "a registered user",
        })?;

        let session = self.session_store.issue(user, ctx.client_ip()).await;

        info!(
            "LOGIN: username={}, client_ip={}",
            session.user.username,
            session.client_ip.as_deref().unwrap_or("-")
        );

        let body = RegisterResponse {
            expires_in: session.expires_in(),
            token: session.token,
            user: session.user.into(),
        };

        Ok(Flow::Respond((StatusCode::CREATED, Json(body)).into_response()))
    }
}
