//! Integration tests for Delicious.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate a scratch database and start the site
//! dl-cli migrate
//! cargo run -p delicious-web
//!
//! # Run the ignored tests against it
//! cargo test -p delicious-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `site` - HTTP tests against a running server (`DELICIOUS_BASE_URL`)
//! - `catalog_postgres` - repository tests against `DELICIOUS_DATABASE_URL`

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, redirect};
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

/// Base URL of the running site (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("DELICIOUS_BASE_URL").unwrap_or_else(|_| "http://localhost:7777".to_string())
}

/// A client that keeps cookies and does not follow redirects, so tests can
/// inspect `Location` headers and flash messages.
///
/// Each client claims its own forwarded IP so the per-IP login limiter
/// doesn't throttle a full test run.
#[must_use]
pub fn client() -> Client {
    let id = Uuid::new_v4();
    let [a, b, c, ..] = *id.as_bytes();
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&format!("10.{a}.{b}.{c}")).expect("valid header"),
    );

    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// An email no other test run has used.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

/// A store name no other test run has used.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix} {}", Uuid::new_v4().simple())
}

/// Register a fresh user; the client is logged in afterwards.
pub async fn register(client: &Client, name: &str) -> String {
    let email = unique_email(&name.to_lowercase());
    let password = "integration-pass";
    let resp = client
        .post(format!("{}/register", base_url()))
        .form(&[
            ("name", name),
            ("email", email.as_str()),
            ("password", password),
            ("password-confirm", password),
        ])
        .send()
        .await
        .expect("Failed to register");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/?success=You%20are%20now%20logged%20in%21");
    email
}

/// Create a store through the add form, returning the redirect target.
pub async fn add_store(client: &Client, name: &str, tags: &[&str]) -> String {
    let mut form = reqwest::multipart::Form::new()
        .text("name", name.to_string())
        .text("description", "Integration test store")
        .text("location[address]", "1 Test St")
        .text("location[coordinates][0]", "-79.38")
        .text("location[coordinates][1]", "43.65");
    for tag in tags {
        form = form.text("tags", (*tag).to_string());
    }

    let resp = client
        .post(format!("{}/add", base_url()))
        .multipart(form)
        .send()
        .await
        .expect("Failed to add store");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    location(&resp).to_string()
}

/// Slug from a `/store/{slug}?success=...` redirect.
#[must_use]
pub fn slug_from_location(location: &str) -> &str {
    location
        .trim_start_matches("/store/")
        .split('?')
        .next()
        .unwrap_or_default()
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(resp: &reqwest::Response) -> &str {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Connect to the database named by `DELICIOUS_DATABASE_URL`.
pub async fn pool() -> PgPool {
    let url = std::env::var("DELICIOUS_DATABASE_URL")
        .map(SecretString::from)
        .expect("DELICIOUS_DATABASE_URL not set");
    delicious_web::db::create_pool(&url)
        .await
        .expect("Failed to connect to database")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_from_location() {
        assert_eq!(
            slug_from_location("/store/coffee-house-2?success=Saved"),
            "coffee-house-2"
        );
        assert_eq!(slug_from_location("/store/tea"), "tea");
    }
}
