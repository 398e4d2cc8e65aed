use std::fmt::Display;

use redis::{AsyncCommands, Client};

/// Creates a Redis client for caching
///
/// The client connects lazily; a Redis that is down surfaces as cache misses
/// at request time, never as a startup failure.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Cache keys, namespaced per concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Metadata lookup by title and optional year.
    MetadataLookup(String, Option<String>),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::MetadataLookup(title, year) => write!(
                f,
                "omdb:{}:{}",
                title.to_lowercase(),
                year.as_deref().unwrap_or("")
            ),
        }
    }
}

/// Best-effort JSON cache over Redis.
///
/// Every failure degrades to a miss; writes are fire-and-forget. The movie
/// catalog never depends on the cache being reachable.
#[derive(Clone)]
pub struct Cache {
    client: Client,
}

impl Cache {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Looks up a cached value; errors and absent keys both read as `None`.
    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::debug!(error = %e, "cache unreachable, treating as miss");
                return None;
            }
        };

        let cached: Option<String> = match conn.get(key.to_string()).await {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, key = %key, "cache read failed");
                return None;
            }
        };

        cached.and_then(|json| match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "stale cache entry, discarding");
                None
            }
        })
    }

    /// Stores a value with a TTL without blocking the caller. The write runs
    /// on a spawned task; failures are logged and dropped.
    pub fn put<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl_secs: u64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "cache serialization failed");
                return;
            }
        };

        let client = self.client.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            let result: redis::RedisResult<()> = async {
                let mut conn = client.get_multiplexed_async_connection().await?;
                conn.set_ex(&key, json, ttl_secs).await
            }
            .await;

            if let Err(e) = result {
                tracing::debug!(error = %e, key = %key, "cache write dropped");
            }
        });
    }
}
