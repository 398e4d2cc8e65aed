use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::MovieRecord,
};

/// Per-user movie document store.
///
/// Reads degrade: an unavailable backend yields an empty list or `None`, never
/// an error. Writes surface failure, but callers cannot distinguish "not
/// found" from a write error.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Returns every movie in the user's collection, ids included.
    async fn list_movies(&self, user_id: &str) -> Vec<MovieRecord>;

    /// Fetches a single movie; missing records and read errors both yield `None`.
    async fn get_movie(&self, user_id: &str, movie_id: &str) -> Option<MovieRecord>;

    /// Stores a new record under a freshly generated id and returns that id.
    /// Any id on the incoming record is ignored.
    async fn add_movie(&self, user_id: &str, movie: MovieRecord) -> AppResult<String>;

    /// Overwrites the record identified by `movie_id`.
    async fn update_movie(&self, user_id: &str, movie_id: &str, movie: MovieRecord)
        -> AppResult<()>;

    /// Removes the record. Deleting an id that does not exist is not an error.
    async fn delete_movie(&self, user_id: &str, movie_id: &str) -> AppResult<()>;
}

/// In-memory catalog keyed by user id, then movie id.
///
/// Backs the test suite and local development without a database.
#[derive(Default)]
pub struct MemoryCatalog {
    collections: RwLock<HashMap<String, HashMap<String, MovieRecord>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CatalogStore for MemoryCatalog {
    async fn list_movies(&self, user_id: &str) -> Vec<MovieRecord> {
        let collections = self.collections.read().await;
        collections
            .get(user_id)
            .map(|movies| movies.values().cloned().collect())
            .unwrap_or_default()
    }

    async fn get_movie(&self, user_id: &str, movie_id: &str) -> Option<MovieRecord> {
        let collections = self.collections.read().await;
        collections
            .get(user_id)
            .and_then(|movies| movies.get(movie_id))
            .cloned()
    }

    async fn add_movie(&self, user_id: &str, mut movie: MovieRecord) -> AppResult<String> {
        let movie_id = Uuid::new_v4().to_string();
        movie.id = movie_id.clone();

        let mut collections = self.collections.write().await;
        collections
            .entry(user_id.to_string())
            .or_default()
            .insert(movie_id.clone(), movie);

        Ok(movie_id)
    }

    async fn update_movie(
        &self,
        user_id: &str,
        movie_id: &str,
        mut movie: MovieRecord,
    ) -> AppResult<()> {
        movie.id = movie_id.to_string();

        let mut collections = self.collections.write().await;
        let movies = collections
            .get_mut(user_id)
            .ok_or(AppError::Store("Error actualizando"))?;

        match movies.get_mut(movie_id) {
            Some(existing) => {
                *existing = movie;
                Ok(())
            }
            None => Err(AppError::Store("Error actualizando")),
        }
    }

    async fn delete_movie(&self, user_id: &str, movie_id: &str) -> AppResult<()> {
        let mut collections = self.collections.write().await;
        if let Some(movies) = collections.get_mut(user_id) {
            movies.remove(movie_id);
        }
        Ok(())
    }
}

/// Typed degraded state used when the backing store failed to initialize at
/// startup. Reads are empty, writes fail, the process keeps serving.
pub struct UnavailableCatalog;

#[async_trait::async_trait]
impl CatalogStore for UnavailableCatalog {
    async fn list_movies(&self, _user_id: &str) -> Vec<MovieRecord> {
        Vec::new()
    }

    async fn get_movie(&self, _user_id: &str, _movie_id: &str) -> Option<MovieRecord> {
        None
    }

    async fn add_movie(&self, _user_id: &str, _movie: MovieRecord) -> AppResult<String> {
        Err(AppError::StoreUnavailable)
    }

    async fn update_movie(
        &self,
        _user_id: &str,
        _movie_id: &str,
        _movie: MovieRecord,
    ) -> AppResult<()> {
        Err(AppError::StoreUnavailable)
    }

    async fn delete_movie(&self, _user_id: &str, _movie_id: &str) -> AppResult<()> {
        Err(AppError::StoreUnavailable)
    }
}
