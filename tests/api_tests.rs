use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use cineteca::api::{create_router, AppState};
use cineteca::models::MovieMetadata;
use cineteca::services::{
    AuthGateway, MemoryCatalog, MemorySessions, MetadataProvider, ResetFailure,
};

// Test doubles

struct StubAuth {
    user: Option<&'static str>,
    reset: Result<(), ResetFailure>,
}

impl StubAuth {
    fn valid() -> Self {
        Self {
            user: Some("uid-test"),
            reset: Ok(()),
        }
    }

    fn invalid() -> Self {
        Self {
            user: None,
            reset: Err(ResetFailure::Other),
        }
    }

    fn with_reset(reset: Result<(), ResetFailure>) -> Self {
        Self {
            user: Some("uid-test"),
            reset,
        }
    }
}

#[async_trait::async_trait]
impl AuthGateway for StubAuth {
    async fn verify_token(&self, _id_token: &str) -> Option<String> {
        self.user.map(str::to_string)
    }

    async fn confirm_password_reset(
        &self,
        _oob_code: &str,
        _new_password: &str,
    ) -> Result<(), ResetFailure> {
        self.reset
    }
}

/// Metadata stub that answers from a script of responses, then keeps
/// repeating the last entry. Counts lookups.
struct ScriptedMetadata {
    calls: AtomicUsize,
    responses: Mutex<VecDeque<Option<MovieMetadata>>>,
}

impl ScriptedMetadata {
    fn new(responses: Vec<Option<MovieMetadata>>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            responses: Mutex::new(responses.into()),
        }
    }

    fn always(response: Option<MovieMetadata>) -> Self {
        Self::new(vec![response])
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for ScriptedMetadata {
    async fn lookup<'a>(&self, _title: &str, _year: Option<&'a str>) -> Option<MovieMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().flatten()
        }
    }
}

fn inception_metadata() -> MovieMetadata {
    MovieMetadata {
        title: "Inception".to_string(),
        year: "2010".to_string(),
        director: "Christopher Nolan".to_string(),
        genre: "Action, Adventure, Sci-Fi".to_string(),
        poster: "https://example.test/inception.jpg".to_string(),
        plot: "A thief who steals corporate secrets.".to_string(),
        imdb_rating: "8.8".to_string(),
    }
}

fn interstellar_metadata() -> MovieMetadata {
    MovieMetadata {
        title: "Interstellar".to_string(),
        year: "2014".to_string(),
        director: "Christopher Nolan".to_string(),
        genre: "Adventure, Drama, Sci-Fi".to_string(),
        poster: "https://example.test/interstellar.jpg".to_string(),
        plot: "Explorers travel through a wormhole.".to_string(),
        imdb_rating: "8.7".to_string(),
    }
}

fn inception_payload() -> Value {
    json!({
        "title": "Inception",
        "year": "2010",
        "director": "C. Nolan",
        "genre": "Sci-Fi"
    })
}

fn create_test_server(auth: StubAuth, metadata: Arc<ScriptedMetadata>) -> TestServer {
    let state = AppState {
        catalog: Arc::new(MemoryCatalog::new()),
        metadata,
        auth: Arc::new(auth),
        sessions: Arc::new(MemorySessions::new(chrono::Duration::minutes(30))),
    };

    let mut server = TestServer::new(create_router(state)).unwrap();
    server.do_save_cookies();
    server
}

async fn login(server: &TestServer) {
    let response = server
        .post("/api/login")
        .json(&json!({ "idToken": "stub-token" }))
        .await;
    response.assert_status_ok();
}

// Auth flow

#[tokio::test]
async fn test_login_then_empty_catalog_for_new_user() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));

    let response = server
        .post("/api/login")
        .json(&json!({ "idToken": "stub-token" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Login exitoso");

    let response = server.get("/api/movies").await;
    response.assert_status_ok();
    let movies: Vec<Value> = response.json();
    assert!(movies.is_empty());
}

#[tokio::test]
async fn test_login_with_invalid_token_is_401() {
    let server = create_test_server(StubAuth::invalid(), Arc::new(ScriptedMetadata::always(None)));

    let response = server
        .post("/api/login")
        .json(&json!({ "idToken": "bad-token" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Token inválido");
}

#[tokio::test]
async fn test_logout_destroys_session() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));
    login(&server).await;

    let response = server.post("/api/logout").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Sesión cerrada");

    let response = server.get("/api/movies").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_movie_routes_require_session() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));

    server
        .get("/api/movies")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .post("/api/movies")
        .json(&inception_payload())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .put("/api/movies/some-id")
        .json(&inception_payload())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .delete("/api/movies/some-id")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // Nothing was stored for the rejected mutations.
    login(&server).await;
    let movies: Vec<Value> = server.get("/api/movies").await.json();
    assert!(movies.is_empty());
}

#[tokio::test]
async fn test_session_gate_wins_over_body_validation() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));

    // A session-less request answers 401 even when its body would not parse.
    let response = server.post("/api/movies").text("no es json").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "No autorizado");

    // Same without any body at all.
    let response = server.put("/api/movies/some-id").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "No autorizado");
}

#[tokio::test]
async fn test_catalog_page_redirects_without_session() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));

    let response = server.get("/").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/login");
}

#[tokio::test]
async fn test_login_page_redirects_when_authenticated() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));
    login(&server).await;

    let response = server.get("/login").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/");
}

// Movies CRUD

#[tokio::test]
async fn test_add_movie_with_metadata_hit() {
    let server = create_test_server(
        StubAuth::valid(),
        Arc::new(ScriptedMetadata::always(Some(inception_metadata()))),
    );
    login(&server).await;

    let response = server.post("/api/movies").json(&inception_payload()).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Película agregada");

    let movies: Vec<Value> = server.get("/api/movies").await.json();
    assert_eq!(movies.len(), 1);
    let movie = &movies[0];
    assert!(!movie["id"].as_str().unwrap().is_empty());
    assert_eq!(movie["title"], "Inception");
    assert_eq!(movie["poster"], "https://example.test/inception.jpg");
    assert_eq!(movie["plot"], "A thief who steals corporate secrets.");
    assert_eq!(movie["imdbRating"], "8.8");
}

#[tokio::test]
async fn test_add_movie_with_metadata_miss_stores_defaults() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));
    login(&server).await;

    server
        .post("/api/movies")
        .json(&inception_payload())
        .await
        .assert_status_ok();

    let movies: Vec<Value> = server.get("/api/movies").await.json();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0]["poster"], "");
    assert_eq!(movies[0]["plot"], "");
    assert_eq!(movies[0]["imdbRating"], "N/A");
}

#[tokio::test]
async fn test_add_movies_get_unique_ids() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));
    login(&server).await;

    server
        .post("/api/movies")
        .json(&inception_payload())
        .await
        .assert_status_ok();
    server
        .post("/api/movies")
        .json(&json!({
            "title": "Memento",
            "year": "2000",
            "director": "C. Nolan",
            "genre": "Thriller"
        }))
        .await
        .assert_status_ok();

    let movies: Vec<Value> = server.get("/api/movies").await.json();
    assert_eq!(movies.len(), 2);
    assert_ne!(movies[0]["id"], movies[1]["id"]);
}

#[tokio::test]
async fn test_add_accepts_numeric_year() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));
    login(&server).await;

    let response = server
        .post("/api/movies")
        .json(&json!({
            "title": "Inception",
            "year": 2010,
            "director": "C. Nolan",
            "genre": "Sci-Fi"
        }))
        .await;
    response.assert_status_ok();

    let movies: Vec<Value> = server.get("/api/movies").await.json();
    assert_eq!(movies[0]["year"], "2010");
}

#[tokio::test]
async fn test_add_names_first_missing_field_and_stores_nothing() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));
    login(&server).await;

    let response = server
        .post("/api/movies")
        .json(&json!({ "director": "C. Nolan", "genre": "Sci-Fi" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Falta title");

    let response = server
        .post("/api/movies")
        .json(&json!({
            "title": "Inception",
            "year": "2010",
            "director": "",
            "genre": "Sci-Fi"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Falta director");

    let movies: Vec<Value> = server.get("/api/movies").await.json();
    assert!(movies.is_empty());
}

#[tokio::test]
async fn test_update_unchanged_title_year_keeps_enrichment_without_lookup() {
    let metadata = Arc::new(ScriptedMetadata::always(Some(inception_metadata())));
    let server = create_test_server(StubAuth::valid(), metadata.clone());
    login(&server).await;

    server
        .post("/api/movies")
        .json(&inception_payload())
        .await
        .assert_status_ok();
    assert_eq!(metadata.calls(), 1);

    let movies: Vec<Value> = server.get("/api/movies").await.json();
    let movie_id = movies[0]["id"].as_str().unwrap().to_string();

    let response = server
        .put(&format!("/api/movies/{}", movie_id))
        .json(&json!({
            "title": "Inception",
            "year": "2010",
            "director": "Christopher Nolan",
            "genre": "Sci-Fi, Thriller"
        }))
        .await;
    response.assert_status_ok();

    // Same title and year: no new lookup, enrichment untouched.
    assert_eq!(metadata.calls(), 1);
    let movies: Vec<Value> = server.get("/api/movies").await.json();
    assert_eq!(movies[0]["director"], "Christopher Nolan");
    assert_eq!(movies[0]["poster"], "https://example.test/inception.jpg");
    assert_eq!(movies[0]["plot"], "A thief who steals corporate secrets.");
    assert_eq!(movies[0]["imdbRating"], "8.8");
}

#[tokio::test]
async fn test_update_changed_title_refreshes_enrichment_on_hit() {
    let metadata = Arc::new(ScriptedMetadata::new(vec![
        Some(inception_metadata()),
        Some(interstellar_metadata()),
    ]));
    let server = create_test_server(StubAuth::valid(), metadata.clone());
    login(&server).await;

    server
        .post("/api/movies")
        .json(&inception_payload())
        .await
        .assert_status_ok();

    let movies: Vec<Value> = server.get("/api/movies").await.json();
    let movie_id = movies[0]["id"].as_str().unwrap().to_string();

    server
        .put(&format!("/api/movies/{}", movie_id))
        .json(&json!({
            "title": "Interstellar",
            "year": "2014",
            "director": "C. Nolan",
            "genre": "Sci-Fi"
        }))
        .await
        .assert_status_ok();

    assert_eq!(metadata.calls(), 2);
    let movies: Vec<Value> = server.get("/api/movies").await.json();
    assert_eq!(movies[0]["poster"], "https://example.test/interstellar.jpg");
    assert_eq!(movies[0]["imdbRating"], "8.7");
}

#[tokio::test]
async fn test_update_changed_title_falls_back_to_existing_on_miss() {
    let metadata = Arc::new(ScriptedMetadata::new(vec![
        Some(inception_metadata()),
        None,
    ]));
    let server = create_test_server(StubAuth::valid(), metadata.clone());
    login(&server).await;

    server
        .post("/api/movies")
        .json(&inception_payload())
        .await
        .assert_status_ok();

    let movies: Vec<Value> = server.get("/api/movies").await.json();
    let movie_id = movies[0]["id"].as_str().unwrap().to_string();

    server
        .put(&format!("/api/movies/{}", movie_id))
        .json(&json!({
            "title": "Inceptionn",
            "year": "2010",
            "director": "C. Nolan",
            "genre": "Sci-Fi"
        }))
        .await
        .assert_status_ok();

    let movies: Vec<Value> = server.get("/api/movies").await.json();
    assert_eq!(movies[0]["title"], "Inceptionn");
    // Miss on re-lookup: enrichment carried over from the stored record.
    assert_eq!(movies[0]["poster"], "https://example.test/inception.jpg");
    assert_eq!(movies[0]["imdbRating"], "8.8");
}

#[tokio::test]
async fn test_update_unknown_movie_is_500() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));
    login(&server).await;

    let response = server
        .put("/api/movies/no-such-id")
        .json(&inception_payload())
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Error actualizando");
}

#[tokio::test]
async fn test_delete_twice_succeeds_both_times() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));
    login(&server).await;

    server
        .post("/api/movies")
        .json(&inception_payload())
        .await
        .assert_status_ok();
    let movies: Vec<Value> = server.get("/api/movies").await.json();
    let movie_id = movies[0]["id"].as_str().unwrap().to_string();

    let first = server.delete(&format!("/api/movies/{}", movie_id)).await;
    first.assert_status_ok();
    let first_body: Value = first.json();

    let second = server.delete(&format!("/api/movies/{}", movie_id)).await;
    second.assert_status_ok();
    let second_body: Value = second.json();

    assert_eq!(first_body, second_body);
    assert_eq!(first_body["message"], "Película eliminada");

    let movies: Vec<Value> = server.get("/api/movies").await.json();
    assert!(movies.is_empty());
}

// Metadata search

#[tokio::test]
async fn test_search_hit_returns_data() {
    let server = create_test_server(
        StubAuth::valid(),
        Arc::new(ScriptedMetadata::always(Some(inception_metadata()))),
    );

    let response = server
        .post("/api/search-omdb")
        .json(&json!({ "title": "Inception", "year": "2010" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["title"], "Inception");
    assert_eq!(body["data"]["imdbRating"], "8.8");
}

#[tokio::test]
async fn test_search_miss_reports_not_found() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));

    let response = server
        .post("/api/search-omdb")
        .json(&json!({ "title": "Nonexistent Movie" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No encontrada");
}

// Password reset flow

#[tokio::test]
async fn test_reset_requires_code_and_password() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));

    let response = server
        .post("/api/olvido-contra")
        .json(&json!({ "oobCode": "abc123" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "Código y contraseña requeridos");
}

#[tokio::test]
async fn test_reset_success() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));

    let response = server
        .post("/api/olvido-contra")
        .json(&json!({ "oobCode": "abc123", "newPassword": "secreta123" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Contraseña cambiada");
}

#[tokio::test]
async fn test_reset_expired_code_is_localized() {
    let server = create_test_server(
        StubAuth::with_reset(Err(ResetFailure::ExpiredCode)),
        Arc::new(ScriptedMetadata::always(None)),
    );

    let response = server
        .post("/api/olvido-contra")
        .json(&json!({ "oobCode": "old-code", "newPassword": "secreta123" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "Enlace expirado");
}

// Provider-action redirects

#[tokio::test]
async fn test_auth_action_reset_password_redirect() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));

    let response = server
        .get("/auth/action")
        .add_query_param("mode", "resetPassword")
        .add_query_param("oobCode", "abc123")
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/olvido-contra?oobCode=abc123");
}

#[tokio::test]
async fn test_reset_page_without_code_redirects_to_login() {
    let server = create_test_server(StubAuth::valid(), Arc::new(ScriptedMetadata::always(None)));

    let response = server.get("/olvido-contra").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(
        response.header("location"),
        "/login?error=Enlace%20inv%C3%A1lido"
    );
}
