//! Handlers for `/api/auth` endpoints.
//!
//! Uniqueness checks happen here, not in the store — the store records
//! whatever it is given, and this layer is responsible for refusing
//! duplicate usernames and emails before calling it.

use axum::{
  Json,
  extract::State,
  http::{StatusCode, header},
  response::IntoResponse,
};
use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;
use serde::Deserialize;

use agora_core::{Error, store::ForumStore, user::{NewUser, User}};

use crate::{
  AppState,
  error::ApiError,
  session::{CurrentUser, clear_session_cookie, session_cookie, session_token},
};

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
  pub username: String,
  pub email:    String,
  pub password: String,
  pub name:     String,
  pub avatar:     Option<String>,
  pub department: Option<String>,
  pub job_title:  Option<String>,
}

/// `POST /api/auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  for (field, value) in [
    ("username", &body.username),
    ("email", &body.email),
    ("password", &body.password),
    ("name", &body.name),
  ] {
    if value.is_empty() {
      return Err(ApiError::BadRequest(format!("{field} is required")));
    }
  }

  if state
    .store
    .get_user_by_username(&body.username)
    .await
    .map_err(ApiError::store)?
    .is_some()
  {
    return Err(Error::DuplicateUsername(body.username).into());
  }
  if state
    .store
    .get_user_by_email(&body.email)
    .await
    .map_err(ApiError::store)?
    .is_some()
  {
    return Err(Error::DuplicateEmail(body.email).into());
  }

  let password_hash = hash_password(&body.password)?;
  let user = state
    .store
    .create_user(NewUser {
      username:   body.username,
      email:      body.email,
      name:       body.name,
      password_hash,
      avatar:     body.avatar,
      department: body.department,
      job_title:  body.job_title,
    })
    .await
    .map_err(ApiError::store)?;

  let token = state.sessions.issue(user.id);
  Ok((
    StatusCode::CREATED,
    [(header::SET_COOKIE, session_cookie(token))],
    Json(user),
  ))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
  pub password: String,
}

/// `POST /api/auth/login`
///
/// Rejects with a single undifferentiated 401 whether the username or the
/// password was wrong.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let user = state
    .store
    .get_user_by_username(&body.username)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;

  verify_password(&body.password, &user.password_hash)?;

  let token = state.sessions.issue(user.id);
  Ok((
    StatusCode::OK,
    [(header::SET_COOKIE, session_cookie(token))],
    Json(user),
  ))
}

// ─── Current user ─────────────────────────────────────────────────────────────

/// `GET /api/auth/me`
pub async fn me<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
) -> Result<Json<User>, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let user = state
    .store
    .get_user(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;
  Ok(Json(user))
}

// ─── Logout ───────────────────────────────────────────────────────────────────

/// `POST /api/auth/logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  headers: axum::http::HeaderMap,
) -> impl IntoResponse
where
  S: ForumStore,
{
  if let Some(token) = session_token(&headers) {
    state.sessions.revoke(token);
  }
  (
    [(header::SET_COOKIE, clear_session_cookie())],
    Json(serde_json::json!({ "message": "logged out" })),
  )
}

// ─── Password helpers ─────────────────────────────────────────────────────────

fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|_| ApiError::PasswordHash)?
      .to_string(),
  )
}

fn verify_password(password: &str, hash: &str) -> Result<(), ApiError> {
  let parsed = PasswordHash::new(hash).map_err(|_| ApiError::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .map_err(|_| ApiError::Unauthorized)
}
