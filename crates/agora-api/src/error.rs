//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("password hashing failed")]
  PasswordHash,

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  /// Wrap a backend error. Used as `.map_err(ApiError::store)?`.
  pub fn store<E>(error: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(error))
  }
}

/// Core errors surface with the status their taxonomy implies: duplicate
/// unique keys are conflicts, a missing vote target is a not-found.
impl From<agora_core::Error> for ApiError {
  fn from(error: agora_core::Error) -> Self {
    match error {
      agora_core::Error::DuplicateUsername(_) | agora_core::Error::DuplicateEmail(_) => {
        Self::Conflict(error.to_string())
      }
      agora_core::Error::MissingVoteTarget(target) => {
        Self::NotFound(format!("{target} not found"))
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
      ApiError::PasswordHash => {
        (StatusCode::INTERNAL_SERVER_ERROR, "password hashing failed".to_string())
      }
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
    };
    (status, Json(json!({ "message": message }))).into_response()
  }
}
