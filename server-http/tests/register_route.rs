use axum::{
    body::Body,
    extract::Request,
    http::{header, Method, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use server_http::{build_router, AppState};
use shared::config::Config;
use std::collections::HashMap;
use tower::{Layer, ServiceExt};
use tower_http::normalize_path::NormalizePathLayer;
use turnstile::auth::AuthError;

fn config(pairs: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(move |key| vars.get(key).cloned())
}

fn app_with(config: &Config) -> (Router, AppState) {
    let state = AppState::from_config(config);
    let router = build_router(state.clone(), config).unwrap();
    (router, state)
}

fn app() -> (Router, AppState) {
    app_with(&Config::default())
}

fn json_post(uri: &str, body: Value) -> Request {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn register_returns_session_from_login_step() {
    let (router, state) = app();

    let response = router
        .oneshot(json_post(
            "/users",
            json!({
                "username": "alice",
                "email": "alice@example.com",
                "display_name": "Alice"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap();
    assert_eq!(token.len(), 64);
    assert_eq!(body["expires_in"], 3600);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["display_name"], "Alice");

    // The token belongs to the user the register step created
    let stored_user = state.user_service.get_user("alice").await.unwrap();
    let sessions = state.session_store.sessions_for("alice");
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].token, token);
    assert_eq!(sessions[0].user.id, stored_user.id);
    assert_eq!(body["user"]["id"], stored_user.id.as_str());
}

#[tokio::test]
async fn empty_object_is_rejected_before_registration() {
    let (router, state) = app();

    let response = router
        .oneshot(json_post("/users", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Validation failed");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["username", "email"]);
}

#[tokio::test]
async fn missing_email_stops_before_register_and_login() {
    let (router, state) = app();

    let response = router
        .oneshot(json_post("/users", json!({ "username": "erin" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["details"][0]["field"], "email");

    // Neither downstream handler ran for the named user
    assert!(matches!(
        state.user_service.get_user("erin").await,
        Err(AuthError::UserNotFound)
    ));
    assert!(state.session_store.sessions_for("erin").is_empty());
}

#[tokio::test]
async fn invalid_fields_never_create_a_user() {
    let (router, state) = app();

    let response = router
        .oneshot(json_post(
            "/users",
            json!({ "username": "bob", "email": "not-an-email" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(matches!(
        state.user_service.get_user("bob").await,
        Err(AuthError::UserNotFound)
    ));
    assert!(state.session_store.sessions_for("bob").is_empty());
}

#[tokio::test]
async fn duplicate_registration_conflicts_without_new_session() {
    let (router, state) = app();
    let payload = json!({ "username": "carol", "email": "carol@example.com" });

    let first = router
        .clone()
        .oneshot(json_post("/users", payload))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = router
        .oneshot(json_post(
            "/users",
            json!({ "username": "Carol", "email": "someone-else@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let body = body_json(second).await;
    assert_eq!(body["error"], "Username is already taken");

    // Login never ran for the rejected attempt
    assert_eq!(state.session_store.sessions_for("carol").len(), 1);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let (router, _state) = app();

    let first = router
        .clone()
        .oneshot(json_post(
            "/users",
            json!({ "username": "dave", "email": "dave@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = router
        .oneshot(json_post(
            "/users",
            json!({ "username": "david", "email": "DAVE@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (router, _state) = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"username\": "))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_json_body_is_unsupported() {
    let (router, _state) = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=erin&email=erin%40example.com"))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let (router, _state) = app_with(&config(&[("TURNSTILE_BODY_LIMIT_BYTES", "32")]));

    let response = router
        .oneshot(json_post(
            "/users",
            json!({ "username": "frank", "email": "frank@example.com", "display_name": "F" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn only_post_is_bound() {
    let (router, _state) = app();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/users")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn trailing_slash_is_normalized() {
    let (router, _state) = app();
    let app = NormalizePathLayer::trim_trailing_slash().layer(router);

    let response = app
        .oneshot(json_post(
            "/users/",
            json!({ "username": "grace", "email": "grace@example.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn users_unit_follows_configured_mount() {
    let (router, _state) = app_with(&config(&[("TURNSTILE_USERS_MOUNT", "/accounts")]));

    let response = router
        .clone()
        .oneshot(json_post(
            "/accounts",
            json!({ "username": "heidi", "email": "heidi@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(json_post(
            "/users",
            json!({ "username": "ivan", "email": "ivan@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pattern_mount_falls_back_to_users() {
    let (router, _state) = app_with(&config(&[("TURNSTILE_USERS_MOUNT", "/api/*")]));

    let response = router
        .oneshot(json_post(
            "/users",
            json!({ "username": "karl", "email": "karl@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn forwarded_client_ip_is_recorded_on_session() {
    let (router, state) = app();

    let mut request = json_post(
        "/users",
        json!({ "username": "judy", "email": "judy@example.com" }),
    );
    request
        .headers_mut()
        .insert("X-Forwarded-For", "203.0.113.5".parse().unwrap());

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let sessions = state.session_store.sessions_for("judy");
    assert_eq!(sessions[0].client_ip.as_deref(), Some("203.0.113.5"));
}

#[tokio::test]
async fn health_check() {
    let (router, _state) = app();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "OK");
}
