//! Film Service Library
//!
//! This library crate defines the modules of a small REST CRUD service for
//! films. It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Modules
//!
//! - **`films`**: The HTTP API. Handlers for list/get/create/update/delete, the
//!   `Film` record, and the mapping of failures to status codes.
//! - **`store`**: The record store. A `FilmStore` trait with a lock-guarded
//!   in-memory backend and a PostgreSQL backend.
//! - **`limiter`**: Per-client request rate limiting, applied before routing.
//! - **`app`**: The service context and router assembly.
//! - **`config`**: Settings from environment variables and command-line flags.
//! - **`telemetry`**: Log subscriber setup (text or JSON).

pub mod app;
pub mod config;
pub mod films;
pub mod limiter;
pub mod store;
pub mod telemetry;
