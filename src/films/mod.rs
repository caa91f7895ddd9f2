//! Films API Module
//!
//! The HTTP face of the service: five handlers that turn a method, path and
//! body into one `FilmStore` call and one response.
//!
//! ## Request Lifecycle
//! 1. **Parse**: The path id must be a base-10 integer; create/update bodies must
//!    decode as a JSON object of film fields. Either failure answers `400`.
//! 2. **Execute**: Exactly one store operation runs.
//! 3. **Respond**: JSON on success, plain text otherwise (`404` missing film,
//!    `500` store failure). Each outcome is logged once.
//!
//! ## Submodules
//! - **`types`**: The `Film` record and its client-writable `FilmFields`.
//! - **`handlers`**: Axum handlers for list/get/create/update/delete.
//! - **`error`**: `ApiError`, the status/message/log-level mapping for failures.
//! - **`protocol`**: Route paths and response texts.

pub mod error;
pub mod handlers;
pub mod protocol;
pub mod types;

#[cfg(test)]
mod tests;
