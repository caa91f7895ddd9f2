use super::{FilmStore, StoreError, StoreResult};
use crate::films::types::{Film, FilmFields, FilmId};

use async_trait::async_trait;
use tokio::sync::RwLock;

struct Inner {
    films: Vec<Film>,
    /// `None` once `FilmId::MAX` has been handed out.
    next_id: Option<FilmId>,
}

pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_films(Vec::new())
    }

    /// Starts from the five demo films, ids 1 through 5.
    pub fn with_seed() -> Self {
        Self::with_films(seed_films())
    }

    /// Starts from an arbitrary set of films. The id counter resumes after the
    /// largest id present.
    pub fn with_films(films: Vec<Film>) -> Self {
        let next_id = match films.iter().map(|f| f.id).max() {
            Some(max) => max.max(0).checked_add(1),
            None => Some(1),
        };
        Self {
            inner: RwLock::new(Inner { films, next_id }),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.films.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.films.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FilmStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Film>> {
        Ok(self.inner.read().await.films.clone())
    }

    async fn get(&self, id: FilmId) -> StoreResult<Film> {
        self.inner
            .read()
            .await
            .films
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn create(&self, fields: FilmFields) -> StoreResult<Film> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id.ok_or(StoreError::IdsExhausted)?;
        inner.next_id = id.checked_add(1);
        let film = Film::from_fields(id, fields);
        inner.films.push(film.clone());
        tracing::debug!("Stored film {} ({} total)", film.id, inner.films.len());
        Ok(film)
    }

    async fn update(&self, id: FilmId, fields: FilmFields) -> StoreResult<Film> {
        let mut inner = self.inner.write().await;
        let slot = inner
            .films
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(StoreError::NotFound(id))?;
        *slot = Film::from_fields(id, fields);
        Ok(slot.clone())
    }

    async fn delete(&self, id: FilmId) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let position = inner
            .films
            .iter()
            .position(|f| f.id == id)
            .ok_or(StoreError::NotFound(id))?;
        inner.films.remove(position);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

pub fn seed_films() -> Vec<Film> {
    [
        ("The Shawshank Redemption", 1994, "Drama"),
        ("The Godfather", 1972, "Crime"),
        ("The Dark Knight", 2008, "Action"),
        ("Pulp Fiction", 1994, "Crime"),
        ("Forrest Gump", 1994, "Drama"),
    ]
    .into_iter()
    .zip(1..)
    .map(|((title, year, filmtype), id)| Film {
        id,
        title: title.to_string(),
        year,
        filmtype: filmtype.to_string(),
    })
    .collect()
}
