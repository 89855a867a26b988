//! # Taskboard API Server Library
//!
//! HTTP surface of Taskboard: routing, request validation, error mapping
//! and configuration. Domain rules and storage live in `taskboard-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder and auth layers
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers layer
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
