//! # Taskboard Shared Library
//!
//! This crate contains the domain types, authorization rules and storage
//! layer used by the Taskboard API server.
//!
//! ## Module Organization
//!
//! - `models`: Users, projects, tasks and partial-update types
//! - `auth`: Password hashing, tokens, request authentication and the
//!   authorization decision table
//! - `store`: The entity store abstraction with in-memory and PostgreSQL
//!   backends, plus the orphan-tolerant read path
//! - `db`: PostgreSQL pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
