use crate::api::RegisterRequest;
use crate::chain::{Flow, Handler, RequestContext};
use crate::error::HandlerError;
use crate::validation::{Form, RegisterForm, UnknownForm};
use async_trait::async_trait;
use std::sync::Arc;
use turnstile::auth::UserService;

/// Build the validator for a named form. Unknown names fail at startup.
pub fn validate(form: &str) -> Result<FormValidator, UnknownForm> {
    Ok(FormValidator {
        form: form.parse()?,
    })
}

/// Rejects malformed payloads before any state is touched
pub struct FormValidator {
    form: Form,
}

#[async_trait]
impl Handler for FormValidator {
    fn name(&self) -> &'static str {
        "validate"
    }

    async fn handle(&self, ctx: &mut RequestContext) -> Result<Flow, HandlerError> {
        match self.form {
            Form::Register => {
                let req: RegisterRequest = ctx.json()?;
                let form = RegisterForm::from_request(req)?;
                ctx.insert(form);
            }
        }

        Ok(Flow::Next)
    }
}

pub fn register(user_service: Arc<UserService>) -> RegisterHandler {
    RegisterHandler { user_service }
}

/// Creates the user described by the validated form
pub struct RegisterHandler {
    user_service: Arc<UserService>,
}

#[async_trait]
impl Handler for RegisterHandler {
    fn name(&self) -> &'static str {
        "register"
    }

    async fn handle(&self, ctx: &mut RequestContext) -> Result<Flow, HandlerError> {
        let form = ctx
            .take::<RegisterForm>()
            .ok_or(HandlerError::MissingContext {
                handler: "register",
                missing: "a validated registration form",
            })?;

        let user = self.user_service.register(form.into()).await?;
        ctx.insert(user);

        Ok(Flow::Next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::{header, Method};
    use turnstile::auth::{InMemoryUserRepository, User};

    async fn context(body: &'static str) -> RequestContext {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        RequestContext::from_request(request, 4096).await.unwrap()
    }

    fn user_service() -> Arc<UserService> {
        Arc::new(UserService::new(Arc::new(InMemoryUserRepository::new())))
    }

    #[test]
    fn test_unknown_form_fails_at_construction() {
        assert!(validate("register").is_ok());
        assert!(matches!(validate("checkout"), Err(UnknownForm(name)) if name == "checkout"));
    }

    #[tokio::test]
    async fn test_validator_stores_form() {
        let validator = validate("register").unwrap();
        let mut ctx = context(r#"{"username":"alice","email":"alice@example.com"}"#).await;

        let flow = validator.handle(&mut ctx).await.unwrap();

        assert!(matches!(flow, Flow::Next));
        assert_eq!(ctx.get::<RegisterForm>().unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_validator_rejects_empty_object() {
        let validator = validate("register").unwrap();
        let mut ctx = context("{}").await;

        let result = validator.handle(&mut ctx).await;

        match result {
            Err(HandlerError::Validation(err)) => assert_eq!(err.errors.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(ctx.get::<RegisterForm>().is_none());
    }

    #[tokio::test]
    async fn test_register_creates_user() {
        let service = user_service();
        let handler = register(service.clone());
        let mut ctx = context("").await;
        ctx.insert(RegisterForm {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            display_name: None,
        });

        let flow = handler.handle(&mut ctx).await.unwrap();

        assert!(matches!(flow, Flow::Next));
        assert!(ctx.get::<RegisterForm>().is_none());
        let user = ctx.get::<User>().unwrap();
        assert_eq!(service.get_user("alice").await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_register_without_form_is_contract_violation() {
        let handler = register(user_service());
        let mut ctx = context("").await;

        let result = handler.handle(&mut ctx).await;
        assert!(matches!(
            result,
            Err(HandlerError::MissingContext { handler: "register", .. })
        ));
    }
}
