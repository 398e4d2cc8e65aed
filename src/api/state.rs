use std::sync::Arc;

use crate::services::{AuthGateway, CatalogStore, MetadataProvider, SessionStore};

/// Shared application state: every external collaborator behind a trait,
/// injected at construction time.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub metadata: Arc<dyn MetadataProvider>,
    pub auth: Arc<dyn AuthGateway>,
    pub sessions: Arc<dyn SessionStore>,
}
