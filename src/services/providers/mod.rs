use crate::models::MovieMetadata;

pub mod omdb;

/// Movie metadata provider abstraction.
///
/// The catalog only needs one operation: look a title up and get back either
/// the mapped metadata or nothing. "Nothing" covers a genuine provider miss,
/// transport failures, and unparseable responses alike; the caller applies
/// default enrichment on any of them.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Looks up a title, optionally disambiguated by year.
    async fn lookup<'a>(&self, title: &str, year: Option<&'a str>) -> Option<MovieMetadata>;
}
