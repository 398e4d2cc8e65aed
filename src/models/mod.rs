pub mod movie;

pub use movie::{Enrichment, MovieFields, MovieMetadata, MoviePayload, MovieRecord};
