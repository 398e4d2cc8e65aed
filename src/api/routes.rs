use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id;

use super::handlers;
use super::AppState;

/// Creates the main router: pages, auth endpoints, and the movies API.
///
/// The movies API sits behind a session middleware that answers 401 before
/// any body is read; pages redirect from inside their handlers instead. The
/// public allow-set is everything else: login page, reset page, provider
/// callback, login/logout, metadata search, reset action.
pub fn create_router(state: AppState) -> Router {
    let movies = Router::new()
        .route(
            "/api/movies",
            get(handlers::list_movies).post(handlers::add_movie),
        )
        .route(
            "/api/movies/:movie_id",
            put(handlers::update_movie).delete(handlers::delete_movie),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            handlers::require_session,
        ));

    Router::new()
        // Pages
        .route("/", get(handlers::catalog_page))
        .route("/login", get(handlers::login_page))
        .route("/olvido-contra", get(handlers::reset_page))
        .route("/auth/action", get(handlers::provider_action))
        // Auth API
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/olvido-contra", post(handlers::reset_password))
        .merge(movies)
        // Metadata search
        .route("/api/search-omdb", post(handlers::search_metadata))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id::assign_request_id))
                .layer(TraceLayer::new_for_http().make_span_with(request_id::request_span))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
