//! Domain models for the web crate.
//!
//! Store and review types live in `delicious-core`; these are the types that
//! only matter to the site (accounts and session state).

pub mod session;
pub mod user;

pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
