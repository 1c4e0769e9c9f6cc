//! Business logic services for the site.
//!
//! # Services
//!
//! - `auth` - Registration, password login and account edits (argon2)
//! - `photos` - Store photo validation, resizing and storage
//!
//! Store creation and editing go through `delicious_core::catalog::StoreService`.

pub mod auth;
pub mod photos;

pub use auth::{AuthError, AuthService, Registration};
pub use photos::{PhotoError, PhotoUpload, remove_photo, store_photo};
