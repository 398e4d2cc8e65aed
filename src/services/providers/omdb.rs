use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    db::{Cache, CacheKey},
    error::AppResult,
    models::MovieMetadata,
    services::providers::MetadataProvider,
};

const LOOKUP_CACHE_TTL: u64 = 3600; // 1 hour
const REQUEST_TIMEOUT_SECS: u64 = 5;

/// OMDb API client.
///
/// One query shape: `?t=<title>&y=<year>&apikey=<key>`. OMDb answers 200 for
/// both hits and misses and signals the difference with a `Response` field.
#[derive(Clone)]
pub struct OmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Option<Cache>,
}

impl OmdbClient {
    /// Builds the client; `cache` is optional and purely an optimization.
    pub fn new(api_key: String, api_url: String, cache: Option<Cache>) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
            cache,
        })
    }

    async fn fetch(&self, title: &str, year: Option<&str>) -> AppResult<OmdbPayload> {
        let mut params = vec![("t", title.to_string()), ("apikey", self.api_key.clone())];
        if let Some(year) = year {
            params.push(("y", year.to_string()));
        }

        let response = self
            .http_client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await?;

        let payload = response.json::<OmdbPayload>().await?;
        Ok(payload)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for OmdbClient {
    async fn lookup<'a>(&self, title: &str, year: Option<&'a str>) -> Option<MovieMetadata> {
        let key = CacheKey::MetadataLookup(title.to_string(), year.map(str::to_string));

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get::<MovieMetadata>(&key).await {
                tracing::debug!(title = %title, "metadata served from cache");
                return Some(hit);
            }
        }

        let payload = match self.fetch(title, year).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, title = %title, "metadata lookup failed");
                return None;
            }
        };

        let metadata = match payload.into_metadata() {
            Some(metadata) => metadata,
            None => {
                tracing::info!(title = %title, "metadata lookup found nothing");
                return None;
            }
        };

        if let Some(cache) = &self.cache {
            cache.put(&key, &metadata, LOOKUP_CACHE_TTL);
        }

        Some(metadata)
    }
}

/// Raw OMDb response. Misses carry `Response: "False"` plus an `Error` field
/// and none of the data fields.
#[derive(Debug, Deserialize)]
struct OmdbPayload {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Year", default)]
    year: Option<String>,
    #[serde(rename = "Director", default)]
    director: Option<String>,
    #[serde(rename = "Genre", default)]
    genre: Option<String>,
    #[serde(rename = "Poster", default)]
    poster: Option<String>,
    #[serde(rename = "Plot", default)]
    plot: Option<String>,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: Option<String>,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

impl OmdbPayload {
    fn into_metadata(self) -> Option<MovieMetadata> {
        if self.response != "True" {
            if let Some(error) = &self.error {
                tracing::debug!(error = %error, "OMDb reported a miss");
            }
            return None;
        }

        Some(MovieMetadata {
            title: self.title.unwrap_or_default(),
            year: self.year.unwrap_or_default(),
            director: self.director.unwrap_or_default(),
            genre: self.genre.unwrap_or_default(),
            poster: self.poster.unwrap_or_default(),
            plot: self.plot.unwrap_or_default(),
            imdb_rating: self.imdb_rating.unwrap_or_else(|| "N/A".to_string()),
        })
    }
}
