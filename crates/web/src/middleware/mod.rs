//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span, see `request_id::make_request_span`)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Rate limiting on login/register (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use rate_limit::auth_rate_limiter;
pub use request_id::{make_request_span, request_id_middleware};
pub use session::create_session_layer;
