use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

/// Enrichment fields derived from the metadata provider, never user-supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    #[serde(default)]
    pub poster: String,
    #[serde(default)]
    pub plot: String,
    #[serde(rename = "imdbRating", default = "default_rating")]
    pub imdb_rating: String,
}

fn default_rating() -> String {
    "N/A".to_string()
}

impl Default for Enrichment {
    fn default() -> Self {
        Self {
            poster: String::new(),
            plot: String::new(),
            imdb_rating: default_rating(),
        }
    }
}

/// A movie document as stored in and returned from a user's collection.
///
/// The `id` is assigned by the catalog store on creation and immutable after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(deserialize_with = "de_year")]
    pub year: String,
    pub director: String,
    pub genre: String,
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

impl MovieRecord {
    /// Builds an unsaved record; the store assigns the id.
    pub fn new(fields: MovieFields, enrichment: Enrichment) -> Self {
        Self {
            id: String::new(),
            title: fields.title,
            year: fields.year,
            director: fields.director,
            genre: fields.genre,
            enrichment,
        }
    }
}

/// The four user-supplied fields, validated non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieFields {
    pub title: String,
    pub year: String,
    pub director: String,
    pub genre: String,
}

/// Incoming add/update payload before validation.
///
/// Every field is optional at the wire level so validation can name the first
/// missing one instead of rejecting the whole body at deserialization time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoviePayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_opt_year")]
    pub year: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
}

impl MoviePayload {
    /// Checks the required fields in order and reports the first one that is
    /// absent or empty.
    pub fn validate(self) -> Result<MovieFields, AppError> {
        let title = require(self.title, "title")?;
        let year = require(self.year, "year")?;
        let director = require(self.director, "director")?;
        let genre = require(self.genre, "genre")?;

        Ok(MovieFields {
            title,
            year,
            director,
            genre,
        })
    }
}

fn require(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::MissingField(field.to_string())),
    }
}

/// Accepts a year sent as either a JSON string or a number and normalizes it
/// to a string. Any other shape counts as absent.
fn de_opt_year<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn de_year<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_opt_year(deserializer)?.unwrap_or_default())
}

/// A metadata hit mapped from the provider's response shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieMetadata {
    pub title: String,
    pub year: String,
    pub director: String,
    pub genre: String,
    pub poster: String,
    pub plot: String,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: String,
}

impl MovieMetadata {
    pub fn enrichment(&self) -> Enrichment {
        Enrichment {
            poster: self.poster.clone(),
            plot: self.plot.clone(),
            imdb_rating: self.imdb_rating.clone(),
        }
    }
}
