//! # Seodesk Shared Library
//!
//! Domain layer of the seodesk SEO agency dashboard, used by the API server.
//!
//! ## Module Organization
//!
//! - `models`: Entities, their inputs, and per-table PostgreSQL queries
//! - `store`: The `Store` trait with PostgreSQL and in-memory backends
//! - `db`: Connection pool and migrations
//! - `auth`: Password hashing, sessions, ownership checks
//! - `activity`: Best-effort audit trail writer
//! - `dashboard`: Per-user dashboard aggregation

pub mod activity;
pub mod auth;
pub mod dashboard;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the seodesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
