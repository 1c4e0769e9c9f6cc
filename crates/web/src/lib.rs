//! Delicious web library.
//!
//! The store site as a library: configuration, Postgres repositories, auth,
//! photo handling and the route handlers, so the binary, the CLI and the
//! tests all share one implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
