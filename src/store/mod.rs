//! Film Record Store
//!
//! Owns the authoritative set of films and implements the CRUD contract that
//! the HTTP handlers build on.
//!
//! ## Backends
//! - **`memory`**: An ordered in-process collection guarded by an async `RwLock`.
//!   Mutations take the write lock, so concurrent writers are serialized.
//!   Ids come from a counter that only grows, so deleted ids are never reused.
//! - **`postgres`**: A single `films` table reached through a `sqlx` pool.
//!   Every statement carries a deadline; there are no multi-statement transactions.

pub mod memory;
pub mod postgres;

use crate::films::types::{Film, FilmFields, FilmId};
use async_trait::async_trait;
use std::time::Duration;

pub use memory::MemoryStore;
pub use postgres::PgFilmStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("film {0} not found")]
    NotFound(FilmId),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    #[error("no film ids left to assign")]
    IdsExhausted,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage contract shared by every backend.
#[async_trait]
pub trait FilmStore: Send + Sync + 'static {
    /// Returns every film in a stable, backend-defined order.
    async fn list(&self) -> StoreResult<Vec<Film>>;

    /// Returns the film with exactly this id, or `NotFound`.
    async fn get(&self, id: FilmId) -> StoreResult<Film>;

    /// Stores a new film under a freshly assigned id and returns it.
    async fn create(&self, fields: FilmFields) -> StoreResult<Film>;

    /// Overwrites every field except the id. `NotFound` when nothing matched.
    async fn update(&self, id: FilmId, fields: FilmFields) -> StoreResult<Film>;

    /// Removes the film. `NotFound` when nothing matched.
    async fn delete(&self, id: FilmId) -> StoreResult<()>;

    /// Short backend name used in startup logs.
    fn backend(&self) -> &'static str;
}
