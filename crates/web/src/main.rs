//! Delicious - store listing, review and ranking site.
//!
//! This binary serves the site on port 7777 by default.
//!
//! # Architecture
//!
//! - Axum web framework with Askama templates for server-side rendering
//! - `PostgreSQL` for stores, reviews, users, hearts and sessions
//! - Slug assignment, tag counts and the top-store ranking from `delicious-core`
//! - Uploaded photos resized on disk and served from `/uploads`
//!
//! Migrations are not run on startup; use `dl-cli migrate`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, middleware::from_fn, routing::get};
use sentry::integrations::tracing as sentry_tracing;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use delicious_web::config::WebConfig;
use delicious_web::middleware::{create_session_layer, make_request_span, request_id_middleware};
use delicious_web::state::AppState;
use delicious_web::{db, routes};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &WebConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Tracing to stdout, with warnings and errors forwarded to Sentry.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "delicious_web=info,delicious_core=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// The site router with every layer applied.
///
/// Sessions sit inside the request ID and trace layers. Sentry wraps everything.
fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());
    let uploads = ServeDir::new(&state.config().uploads_dir);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/uploads", uploads)
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[tokio::main]
async fn main() {
    let config = WebConfig::from_env().expect("Failed to load configuration");

    // Sentry first so the tracing layer has a client to report to.
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    tokio::fs::create_dir_all(&config.uploads_dir)
        .await
        .expect("Failed to create uploads directory");
    tracing::info!(dir = %config.uploads_dir.display(), "Photo uploads directory ready");

    let addr = config.socket_addr();
    let app = app(AppState::new(config, pool));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!("delicious listening on {}", addr);

    // Peer addresses feed the login rate limiter when no proxy header is present.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
