//! Router tests that never reach the database.
//!
//! The pool is lazy and nothing here logs in, so no connection is opened:
//! sessions are only loaded when a session cookie is sent.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use delicious_web::config::WebConfig;
use delicious_web::middleware::create_session_layer;
use delicious_web::routes::routes;
use delicious_web::state::AppState;

fn config(map_key: Option<&str>) -> WebConfig {
    WebConfig {
        database_url: SecretString::from("postgres://localhost/delicious_unused".to_string()),
        host: "127.0.0.1".parse().unwrap(),
        port: 7777,
        base_url: "http://localhost:7777".to_string(),
        session_secret: SecretString::from("x".repeat(64)),
        uploads_dir: PathBuf::from("target/test-uploads"),
        map_key: map_key.map(String::from),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

fn app(map_key: Option<&str>) -> Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/delicious_unused")
        .unwrap();
    let state = AppState::new(config(map_key), pool);
    let sessions = create_session_layer(state.pool(), state.config());

    routes().layer(sessions).with_state(state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_login_page_renders_flash() {
    let response = app(None)
        .oneshot(get("/login?error=Failed%20Login!"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("<h2>Login</h2>"));
    assert!(body.contains("Failed Login!"));
}

#[tokio::test]
async fn test_flash_is_escaped() {
    let response = app(None)
        .oneshot(get("/register?error=%3Cscript%3E"))
        .await
        .unwrap();

    let body = body_text(response).await;
    assert!(!body.contains("<script>alert"));
    assert!(body.contains("&#60;script&#62;") || body.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn test_add_page_redirects_anonymous_users() {
    let response = app(None).oneshot(get("/add")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("/login?error="));
}

#[tokio::test]
async fn test_heart_api_rejects_anonymous_users() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/stores/1/heart")
        .body(Body::empty())
        .unwrap();
    let response = app(None).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_map_page_carries_key() {
    let response = app(Some("tile-key")).oneshot(get("/map")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("data-map-key=\"tile-key\""));
}

#[tokio::test]
async fn test_empty_search_returns_empty_list() {
    let response = app(None).oneshot(get("/api/search?q=%20")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "[]");
}

#[tokio::test]
async fn test_near_rejects_out_of_range_latitude() {
    let response = app(None)
        .oneshot(get("/api/stores/near?lat=91&lng=0"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_is_rate_limited_per_ip() {
    let app = app(None);
    let attempt = || {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header("x-forwarded-for", "203.0.113.9")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("email=&password="))
            .unwrap()
    };

    for _ in 0..5 {
        let response = app.clone().oneshot(attempt()).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/login?error=Failed%20Login%21"
        );
    }

    let response = app.clone().oneshot(attempt()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
