use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    models::{MoviePayload, MovieRecord},
    services::enrichment,
};

use super::AppState;

pub const SESSION_COOKIE: &str = "cineteca_session";

// Static page shells; the catalog UI itself lives client-side.

const CATALOG_PAGE: &str = "<!DOCTYPE html>\
<html lang=\"es\"><head><meta charset=\"utf-8\"><title>Mi Catálogo</title></head>\
<body><h1>Mi Catálogo de Películas</h1></body></html>";

const LOGIN_PAGE: &str = "<!DOCTYPE html>\
<html lang=\"es\"><head><meta charset=\"utf-8\"><title>Iniciar sesión</title></head>\
<body><h1>Iniciar sesión</h1></body></html>";

const RESET_PAGE: &str = "<!DOCTYPE html>\
<html lang=\"es\"><head><meta charset=\"utf-8\"><title>Restablecer contraseña</title></head>\
<body><h1>Restablecer contraseña</h1></body></html>";

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "idToken", default)]
    pub id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(rename = "oobCode", default)]
    pub oob_code: Option<String>,
    #[serde(rename = "newPassword", default)]
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPageQuery {
    #[serde(rename = "oobCode", default)]
    pub oob_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderActionQuery {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(rename = "oobCode", default)]
    pub oob_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }

    fn fail(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
        }
    }
}

/// Resolves the session cookie to a user id; anything short of an active
/// session reads as unauthorized.
async fn current_user(state: &AppState, jar: &CookieJar) -> AppResult<String> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AppError::Unauthorized)?;

    state.sessions.get(&token).await.ok_or(AppError::Unauthorized)
}

/// User id resolved by [`require_session`], handed to handlers behind it.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

/// Session gate for the movies API. Runs ahead of body extraction, so an
/// unauthenticated request answers 401 no matter what its payload looks like.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let user_id = current_user(&state, &jar).await?;
    request.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(request).await)
}

// Pages

/// Catalog page; needs an active session, otherwise bounce to login.
pub async fn catalog_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    if current_user(&state, &jar).await.is_err() {
        return Redirect::to("/login").into_response();
    }
    Html(CATALOG_PAGE).into_response()
}

/// Login page; an already-authenticated user goes straight to the catalog.
pub async fn login_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    if current_user(&state, &jar).await.is_ok() {
        return Redirect::to("/").into_response();
    }
    Html(LOGIN_PAGE).into_response()
}

/// Reset-password page; a reset code is mandatory.
pub async fn reset_page(Query(params): Query<ResetPageQuery>) -> Response {
    match params.oob_code.as_deref() {
        Some(code) if !code.is_empty() => Html(RESET_PAGE).into_response(),
        _ => Redirect::to("/login?error=Enlace%20inv%C3%A1lido").into_response(),
    }
}

/// Generic identity-provider callback: dispatch on `mode` to the localized
/// page for that action.
pub async fn provider_action(Query(params): Query<ProviderActionQuery>) -> Redirect {
    match params.mode.as_deref() {
        Some("resetPassword") => {
            let code = params.oob_code.unwrap_or_default();
            Redirect::to(&format!("/olvido-contra?oobCode={}", code))
        }
        Some("verifyEmail") => Redirect::to("/login?message=Email%20verificado"),
        _ => Redirect::to("/login"),
    }
}

// Auth API

/// Verifies the identity token and establishes a session on success.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiMessage>), (StatusCode, Json<ApiMessage>)> {
    let id_token = request.id_token.unwrap_or_default();

    let Some(user_id) = state.auth.verify_token(&id_token).await else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiMessage::fail("Token inválido")),
        ));
    };

    let token = state.sessions.create(&user_id).await;
    tracing::info!(user_id = %user_id, "session established");

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), Json(ApiMessage::ok("Login exitoso"))))
}

/// Clears the session unconditionally; always reports success.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiMessage>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.destroy(cookie.value()).await;
    }

    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(removal), Json(ApiMessage::ok("Sesión cerrada")))
}

/// Confirms a password reset against the identity provider, mapping failure
/// kinds to localized messages.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetRequest>,
) -> (StatusCode, Json<ApiMessage>) {
    let code = request.oob_code.unwrap_or_default();
    let new_password = request.new_password.unwrap_or_default();

    if code.is_empty() || new_password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::fail("Código y contraseña requeridos")),
        );
    }

    match state.auth.confirm_password_reset(&code, &new_password).await {
        Ok(()) => (StatusCode::OK, Json(ApiMessage::ok("Contraseña cambiada"))),
        Err(failure) => (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::fail(failure.message())),
        ),
    }
}

// Movies API

/// Returns every movie in the authenticated user's collection.
pub async fn list_movies(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> AppResult<Json<Vec<MovieRecord>>> {
    let movies = state.catalog.list_movies(&user_id).await;
    Ok(Json(movies))
}

/// Validates, enriches and stores a new movie.
pub async fn add_movie(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<MoviePayload>,
) -> AppResult<Json<ApiMessage>> {
    let fields = payload.validate()?;

    let enrichment = enrichment::enrich_new(state.metadata.as_ref(), &fields).await;
    let record = MovieRecord::new(fields, enrichment);

    state.catalog.add_movie(&user_id, record).await.map_err(|e| {
        tracing::error!(error = %e, "adding movie failed");
        AppError::Store("Error agregando")
    })?;

    Ok(Json(ApiMessage::ok("Película agregada")))
}

/// Overwrites an existing movie, re-enriching only when title or year changed.
pub async fn update_movie(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(movie_id): Path<String>,
    Json(payload): Json<MoviePayload>,
) -> AppResult<Json<ApiMessage>> {
    let fields = payload.validate()?;

    let existing = state.catalog.get_movie(&user_id, &movie_id).await;
    let enrichment =
        enrichment::enrich_update(state.metadata.as_ref(), existing.as_ref(), &fields).await;
    let record = MovieRecord::new(fields, enrichment);

    state
        .catalog
        .update_movie(&user_id, &movie_id, record)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, movie_id = %movie_id, "updating movie failed");
            AppError::Store("Error actualizando")
        })?;

    Ok(Json(ApiMessage::ok("Película actualizada")))
}

/// Removes a movie; deleting an absent id still succeeds.
pub async fn delete_movie(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(movie_id): Path<String>,
) -> AppResult<Json<ApiMessage>> {
    state
        .catalog
        .delete_movie(&user_id, &movie_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, movie_id = %movie_id, "deleting movie failed");
            AppError::Store("Error eliminando")
        })?;

    Ok(Json(ApiMessage::ok("Película eliminada")))
}

/// Public metadata search; misses and lookup failures answer 200 with
/// `success: false`.
pub async fn search_metadata(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Json<serde_json::Value> {
    let year = request.year.as_deref().filter(|y| !y.is_empty());

    match state.metadata.lookup(&request.title, year).await {
        Some(metadata) => Json(json!({ "success": true, "data": metadata })),
        None => Json(json!({ "success": false, "message": "No encontrada" })),
    }
}
