pub mod auth;
pub mod catalog;
pub mod enrichment;
pub mod providers;
pub mod session;

pub use auth::{AuthGateway, ResetFailure};
pub use catalog::{CatalogStore, MemoryCatalog, UnavailableCatalog};
pub use providers::MetadataProvider;
pub use session::{MemorySessions, SessionStore};
