use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cineteca::{
    api::{create_router, AppState},
    config::Config,
    db::{self, PgCatalog},
    services::{
        auth::FirebaseAuth, providers::omdb::OmdbClient, CatalogStore, MemorySessions,
        UnavailableCatalog,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cineteca=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // A store that cannot initialize degrades the process, it does not kill it.
    let catalog: Arc<dyn CatalogStore> = match init_catalog(&config.database_url).await {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            tracing::error!(error = %e, "document store unavailable, serving degraded");
            Arc::new(UnavailableCatalog)
        }
    };

    let cache = match db::create_redis_client(&config.redis_url) {
        Ok(client) => Some(db::Cache::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "metadata cache disabled");
            None
        }
    };

    let metadata = Arc::new(OmdbClient::new(
        config.omdb_api_key.clone(),
        config.omdb_api_url.clone(),
        cache,
    )?);

    let auth = Arc::new(FirebaseAuth::new(
        config.identity_api_key.clone(),
        config.identity_api_url.clone(),
    )?);

    let sessions = Arc::new(MemorySessions::new(chrono::Duration::minutes(
        config.session_ttl_minutes,
    )));

    let state = AppState {
        catalog,
        metadata,
        auth,
        sessions,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "cineteca listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn init_catalog(database_url: &str) -> anyhow::Result<PgCatalog> {
    let pool = db::create_pool(database_url).await?;
    PgCatalog::migrate(&pool).await?;
    Ok(PgCatalog::new(pool))
}
