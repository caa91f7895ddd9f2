//! PostgreSQL-backed film store.
//!
//! Expects a single table:
//!
//! ```sql
//! CREATE TABLE films (id serial PRIMARY KEY, title text, year integer, filmtype text);
//! ```
//!
//! Columns are nullable, so NULLs decode to zero values.

use super::{FilmStore, StoreError, StoreResult};
use crate::films::types::{Film, FilmFields, FilmId};

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::future::Future;
use std::time::Duration;

type FilmRow = (i32, Option<String>, Option<i32>, Option<String>);

#[derive(Clone)]
pub struct PgFilmStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgFilmStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Opens a pool. Acquiring a connection is bounded by the same deadline
    /// as statements.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(timeout)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool, timeout))
    }

    /// Creates the `films` table when it does not exist yet.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        self.bounded(
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS films (
                    id serial PRIMARY KEY,
                    title text,
                    year integer,
                    filmtype text
                )
                "#,
            )
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn bounded<T, F>(&self, statement: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, statement).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}

fn film_from_row((id, title, year, filmtype): FilmRow) -> Film {
    Film {
        id,
        title: title.unwrap_or_default(),
        year: year.unwrap_or_default(),
        filmtype: filmtype.unwrap_or_default(),
    }
}

#[async_trait]
impl FilmStore for PgFilmStore {
    async fn list(&self) -> StoreResult<Vec<Film>> {
        let rows = self
            .bounded(
                sqlx::query_as::<_, FilmRow>(
                    "SELECT id, title, year, filmtype FROM films ORDER BY id",
                )
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows.into_iter().map(film_from_row).collect())
    }

    async fn get(&self, id: FilmId) -> StoreResult<Film> {
        let row = self
            .bounded(
                sqlx::query_as::<_, FilmRow>(
                    "SELECT id, title, year, filmtype FROM films WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&self.pool),
            )
            .await?;
        row.map(film_from_row).ok_or(StoreError::NotFound(id))
    }

    async fn create(&self, fields: FilmFields) -> StoreResult<Film> {
        let (id,) = self
            .bounded(
                sqlx::query_as::<_, (i32,)>(
                    "INSERT INTO films (title, year, filmtype) VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(&fields.title)
                .bind(fields.year)
                .bind(&fields.filmtype)
                .fetch_one(&self.pool),
            )
            .await?;
        Ok(Film::from_fields(id, fields))
    }

    async fn update(&self, id: FilmId, fields: FilmFields) -> StoreResult<Film> {
        let row = self
            .bounded(
                sqlx::query_as::<_, FilmRow>(
                    r#"
                    UPDATE films SET title = $1, year = $2, filmtype = $3
                    WHERE id = $4
                    RETURNING id, title, year, filmtype
                    "#,
                )
                .bind(&fields.title)
                .bind(fields.year)
                .bind(&fields.filmtype)
                .bind(id)
                .fetch_optional(&self.pool),
            )
            .await?;
        row.map(film_from_row).ok_or(StoreError::NotFound(id))
    }

    async fn delete(&self, id: FilmId) -> StoreResult<()> {
        let result = self
            .bounded(
                sqlx::query("DELETE FROM films WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
