//! API integration tests
//!
//! These drive the full router in-process. The pool connects lazily, so every
//! request here must be answered before any query reaches the database.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use biblio_server::{
    api,
    config::AppConfig,
    models::user::{Role, UserClaims},
    repository::Repository,
    services::Services,
    AppState,
};

const READER_ID: i32 = 7;
const LIBRARIAN_ID: i32 = 1;

fn build_app() -> (Router, AppConfig) {
    let config = AppConfig::default();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("lazy pool");

    let services = Services::new(Repository::new(pool), config.auth.clone());
    let state = AppState {
        config: Arc::new(config.clone()),
        services: Arc::new(services),
    };

    (api::router(state), config)
}

fn token_for(config: &AppConfig, user_id: i32, role: Role) -> String {
    let now = Utc::now().timestamp();
    UserClaims {
        sub: user_id.to_string(),
        user_id,
        role,
        exp: now + 3600,
        iat: now,
    }
    .create_token(&config.auth.jwt_secret)
    .expect("token")
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = build_app();

    let response = app
        .oneshot(request(Method::GET, "/api/v1/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (app, _) = build_app();

    let response = app
        .oneshot(request(Method::GET, "/api-docs/openapi.json", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"]["/loans"].is_object());
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let (app, _) = build_app();

    let response = app
        .oneshot(request(Method::GET, "/api/v1/books", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "NotAuthenticated");
}

#[tokio::test]
async fn test_forged_token_is_rejected() {
    let (app, _) = build_app();

    let mut other = AppConfig::default();
    other.auth.jwt_secret = "some-other-secret".to_string();
    let token = token_for(&other, LIBRARIAN_ID, Role::Librarian);

    let response = app
        .oneshot(request(Method::GET, "/api/v1/loans", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reader_cannot_delete_book() {
    let (app, config) = build_app();
    let token = token_for(&config, READER_ID, Role::Reader);

    let response = app
        .oneshot(request(Method::DELETE, "/api/v1/books/1", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"], "NotAuthorized");
}

#[tokio::test]
async fn test_reader_cannot_create_author() {
    let (app, config) = build_app();
    let token = token_for(&config, READER_ID, Role::Reader);

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/authors",
            Some(&token),
            Some(json!({ "first_name": "Ursula", "last_name": "Le Guin" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reader_cannot_list_users_or_loans() {
    let (app, config) = build_app();
    let token = token_for(&config, READER_ID, Role::Reader);

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/users", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(request(Method::GET, "/api/v1/loans?status=ON_LOAN", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reader_cannot_view_other_users_loans() {
    let (app, config) = build_app();
    let token = token_for(&config, READER_ID, Role::Reader);

    let response = app
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/users/{}/loans", READER_ID + 1),
            Some(&token),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reader_cannot_borrow_for_someone_else() {
    let (app, config) = build_app();
    let token = token_for(&config, READER_ID, Role::Reader);

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/loans",
            Some(&token),
            Some(json!({
                "book_id": 1,
                "borrower_id": READER_ID + 1,
                "librarian_id": LIBRARIAN_ID,
                "expected_return": (Utc::now() + Duration::days(14)).to_rfc3339(),
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_loan_due_today_is_rejected() {
    let (app, config) = build_app();
    let token = token_for(&config, READER_ID, Role::Reader);

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/loans",
            Some(&token),
            Some(json!({
                "book_id": 1,
                "borrower_id": READER_ID,
                "librarian_id": LIBRARIAN_ID,
                "expected_return": Utc::now().to_rfc3339(),
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_reader_cannot_return_loan() {
    let (app, config) = build_app();
    let token = token_for(&config, READER_ID, Role::Reader);

    let response = app
        .oneshot(request(Method::POST, "/api/v1/loans/1/return", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_return_body_is_rejected() {
    let (app, config) = build_app();
    let token = token_for(&config, LIBRARIAN_ID, Role::Librarian);

    for body in [
        json!({ "actual_return": "not-a-date" }),
        json!({ "librarian_id": "x" }),
    ] {
        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/v1/loans/1/return", Some(&token), Some(body)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "BadValue");
    }
}
