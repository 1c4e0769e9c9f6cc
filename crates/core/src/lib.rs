//! Delicious Core - domain types and catalog logic.
//!
//! This crate is shared by every Delicious component:
//! - `web` - the server-rendered site and its JSON endpoints
//! - `cli` - migrations, seeding and catalog reports
//!
//! # Architecture
//!
//! The core crate holds types, pure functions and the [`catalog::StoreCatalog`]
//! trait - no database access, no HTTP. Persistence plugs in by implementing
//! the trait.
//!
//! # Modules
//!
//! - [`types`] - IDs, email, locations, stores and reviews
//! - [`catalog`] - slug assignment, tag counts, top-store ranking and the
//!   validate-then-save store pipeline

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod types;

pub use types::*;
