use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::MovieRecord,
    services::catalog::CatalogStore,
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse. A failure
/// here is the "store unavailable" startup condition; the caller decides how
/// to degrade.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Document-style catalog over Postgres: one JSONB document per movie, keyed
/// by `(user_id, movie_id)`.
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensures the documents table exists.
    pub async fn migrate(pool: &PgPool) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS movies (
                user_id  TEXT NOT NULL,
                movie_id TEXT NOT NULL,
                doc      JSONB NOT NULL,
                PRIMARY KEY (user_id, movie_id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    fn encode(movie: &MovieRecord) -> AppResult<serde_json::Value> {
        serde_json::to_value(movie)
            .map_err(|e| AppError::Internal(format!("movie serialization failed: {}", e)))
    }
}

#[async_trait::async_trait]
impl CatalogStore for PgCatalog {
    async fn list_movies(&self, user_id: &str) -> Vec<MovieRecord> {
        let rows = sqlx::query("SELECT doc FROM movies WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "listing movies failed, returning empty");
                return Vec::new();
            }
        };

        rows.into_iter()
            .filter_map(|row| {
                let doc: serde_json::Value = row.get("doc");
                match serde_json::from_value(doc) {
                    Ok(movie) => Some(movie),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping undecodable movie document");
                        None
                    }
                }
            })
            .collect()
    }

    async fn get_movie(&self, user_id: &str, movie_id: &str) -> Option<MovieRecord> {
        let row = sqlx::query("SELECT doc FROM movies WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await;

        match row {
            Ok(Some(row)) => {
                let doc: serde_json::Value = row.get("doc");
                match serde_json::from_value(doc) {
                    Ok(movie) => Some(movie),
                    Err(e) => {
                        tracing::warn!(error = %e, movie_id = %movie_id, "undecodable movie document");
                        None
                    }
                }
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, movie_id = %movie_id, "movie fetch failed");
                None
            }
        }
    }

    async fn add_movie(&self, user_id: &str, mut movie: MovieRecord) -> AppResult<String> {
        let movie_id = Uuid::new_v4().to_string();
        movie.id = movie_id.clone();

        sqlx::query("INSERT INTO movies (user_id, movie_id, doc) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(&movie_id)
            .bind(Self::encode(&movie)?)
            .execute(&self.pool)
            .await?;

        Ok(movie_id)
    }

    async fn update_movie(
        &self,
        user_id: &str,
        movie_id: &str,
        mut movie: MovieRecord,
    ) -> AppResult<()> {
        movie.id = movie_id.to_string();

        let result = sqlx::query(
            "UPDATE movies SET doc = $3 WHERE user_id = $1 AND movie_id = $2",
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(Self::encode(&movie)?)
        .execute(&self.pool)
        .await?;

        // A missing record reads the same as a write error to the caller.
        if result.rows_affected() == 0 {
            return Err(AppError::Store("Error actualizando"));
        }

        Ok(())
    }

    async fn delete_movie(&self, user_id: &str, movie_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM movies WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
