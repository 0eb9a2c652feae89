//! Session-cookie authentication.
//!
//! Sessions are opaque UUID tokens held in process memory, matching the
//! store's own lifetime: a restart logs everyone out along with
//! discarding the data they could see.

use std::{
  collections::HashMap,
  sync::{Mutex, PoisonError},
};

use axum::http::{HeaderMap, header, request::Parts};
use axum::extract::FromRequestParts;
use uuid::Uuid;

use agora_core::{store::ForumStore, user::UserId};

use crate::{AppState, error::ApiError};

pub const SESSION_COOKIE: &str = "session";

// ─── Session store ───────────────────────────────────────────────────────────

/// Live session tokens, mapped to the user they authenticate.
#[derive(Default)]
pub struct SessionStore {
  sessions: Mutex<HashMap<Uuid, UserId>>,
}

impl SessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Mint a token for `user_id`.
  pub fn issue(&self, user_id: UserId) -> Uuid {
    let token = Uuid::new_v4();
    self.locked().insert(token, user_id);
    token
  }

  pub fn lookup(&self, token: Uuid) -> Option<UserId> {
    self.locked().get(&token).copied()
  }

  pub fn revoke(&self, token: Uuid) {
    self.locked().remove(&token);
  }

  fn locked(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, UserId>> {
    self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

// ─── Cookie helpers ──────────────────────────────────────────────────────────

/// Extract the session token from a `Cookie` header, if present and
/// well-formed.
pub fn session_token(headers: &HeaderMap) -> Option<Uuid> {
  let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
  cookies
    .split(';')
    .filter_map(|pair| pair.trim().strip_prefix("session="))
    .find_map(|value| Uuid::parse_str(value).ok())
}

/// The `Set-Cookie` value that establishes a session.
pub fn session_cookie(token: Uuid) -> String {
  format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// The `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie() -> String {
  format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The authenticated user behind the request's session cookie.
/// Rejects with 401 when the cookie is missing, malformed, or stale.
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: ForumStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = session_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
    let user_id = state.sessions.lookup(token).ok_or(ApiError::Unauthorized)?;
    Ok(CurrentUser(user_id))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;

  fn headers(cookie: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
    headers
  }

  #[test]
  fn issue_lookup_revoke_roundtrip() {
    let sessions = SessionStore::new();
    let token = sessions.issue(2);
    assert_eq!(sessions.lookup(token), Some(2));

    sessions.revoke(token);
    assert_eq!(sessions.lookup(token), None);
  }

  #[test]
  fn token_is_parsed_among_other_cookies() {
    let sessions = SessionStore::new();
    let token = sessions.issue(2);
    let parsed = session_token(&headers(&format!(
      "theme=dark; session={token}; lang=en"
    )));
    assert_eq!(parsed, Some(token));
  }

  #[test]
  fn malformed_or_missing_token_is_none() {
    assert_eq!(session_token(&headers("session=not-a-uuid")), None);
    assert_eq!(session_token(&headers("theme=dark")), None);
    assert_eq!(session_token(&HeaderMap::new()), None);
  }
}
