use crate::{
    models::{Enrichment, MovieFields, MovieRecord},
    services::providers::MetadataProvider,
};

/// Enrichment for a brand-new record: always attempt a lookup by title and
/// fall back to the defaults on a miss.
pub async fn enrich_new(provider: &dyn MetadataProvider, fields: &MovieFields) -> Enrichment {
    provider
        .lookup(&fields.title, None)
        .await
        .map(|metadata| metadata.enrichment())
        .unwrap_or_default()
}

/// Enrichment for an update, given the existing record if one could be read.
///
/// Only a changed title or year triggers a fresh lookup; a miss falls back to
/// the existing record's fields. Unchanged title and year carry the existing
/// fields forward without touching the provider. No readable existing record
/// means the defaults apply and the store write decides the outcome.
pub async fn enrich_update(
    provider: &dyn MetadataProvider,
    existing: Option<&MovieRecord>,
    fields: &MovieFields,
) -> Enrichment {
    let Some(previous) = existing else {
        return Enrichment::default();
    };

    let changed = previous.title != fields.title || previous.year != fields.year;
    if !changed {
        return previous.enrichment.clone();
    }

    match provider.lookup(&fields.title, None).await {
        Some(metadata) => metadata.enrichment(),
        None => previous.enrichment.clone(),
    }
}
