//! # Taskhub Shared Library
//!
//! Shared types and business logic used by the Taskhub API server.
//!
//! ## Module Organization
//!
//! - `models`: database models (users, tasks)
//! - `auth`: session tokens and password hashing
//! - `db`: connection pool and migrations
//! - `email`: transactional notification client
//! - `avatar`: avatar image normalization

pub mod auth;
pub mod avatar;
pub mod db;
pub mod email;
pub mod models;

/// Current version of the Taskhub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
