//! JSON REST API for the Agora forum backend.
//!
//! Exposes an axum [`Router`] backed by any [`agora_core::store::ForumStore`].
//! This layer owns everything the store deliberately does not: session
//! authentication, duplicate and existence checks, view counting, the
//! answered/AI flags, and the calls out to the optional collaborators
//! (assistant, context store, webhook, file storage).

pub mod auth;
pub mod chat;
pub mod documents;
pub mod error;
pub mod forum;
pub mod providers;
pub mod session;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  extract::State,
  routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use agora_core::store::ForumStore;

pub use error::ApiError;
use providers::Providers;
use session::SessionStore;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `AGORA_*` environment.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
  /// Directory uploads are written to; created at startup if missing.
  #[serde(default = "default_upload_dir")]
  pub upload_dir: PathBuf,
  /// Base URL of the text-generation provider. Absent = no AI answers.
  pub assistant_url: Option<String>,
  /// Base URL of the embedding/context provider. Absent = no retrieval.
  pub context_url: Option<String>,
  /// Incoming-webhook URL for team-chat notifications.
  pub webhook_url: Option<String>,
}

fn default_host() -> String {
  "0.0.0.0".to_string()
}

fn default_port() -> u16 {
  5001
}

fn default_upload_dir() -> PathBuf {
  PathBuf::from("uploads")
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:          default_host(),
      port:          default_port(),
      upload_dir:    default_upload_dir(),
      assistant_url: None,
      context_url:   None,
      webhook_url:   None,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:     Arc<S>,
  pub sessions:  Arc<SessionStore>,
  pub providers: Arc<Providers>,
  pub config:    Arc<ServerConfig>,
}

// Hand-written so `S` itself need not be `Clone`.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      sessions:  Arc::clone(&self.sessions),
      providers: Arc::clone(&self.providers),
      config:    Arc::clone(&self.config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the forum API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ForumStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/", get(index))
    .route("/health", get(health::<S>))
    // Auth
    .route("/api/auth/register", post(auth::register::<S>))
    .route("/api/auth/login", post(auth::login::<S>))
    .route("/api/auth/me", get(auth::me::<S>))
    .route("/api/auth/logout", post(auth::logout::<S>))
    // Forum
    .route("/api/forum/search", get(forum::search::<S>))
    .route("/api/forum/{category}", get(forum::list_category::<S>))
    .route("/api/forum/{category}/posts", post(forum::create_post::<S>))
    .route("/api/forum/posts/{id}", get(forum::get_post::<S>))
    .route("/api/forum/posts/{id}/comments", post(forum::create_comment::<S>))
    .route("/api/forum/posts/{id}/votes", post(forum::vote_post::<S>))
    .route("/api/forum/comments/{id}/votes", post(forum::vote_comment::<S>))
    // AI chats
    .route("/api/chats", post(chat::create_chat::<S>).get(chat::list_chats::<S>))
    .route("/api/chats/{id}", get(chat::get_chat::<S>))
    .route("/api/chats/{id}/messages", post(chat::create_message::<S>))
    // Documents
    .route("/api/documents", post(documents::upload::<S>).get(documents::list::<S>))
    .route(
      "/api/documents/{id}",
      get(documents::get_one::<S>).delete(documents::delete_one::<S>),
    )
    .route("/api/documents/{id}/download", get(documents::download::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Status endpoints ─────────────────────────────────────────────────────────

async fn index() -> Json<serde_json::Value> {
  Json(json!({
    "message": "Agora forum backend",
    "status": "operational",
    "timestamp": Utc::now().to_rfc3339(),
  }))
}

async fn health<S>(State(state): State<AppState<S>>) -> Json<serde_json::Value>
where
  S: ForumStore,
{
  Json(json!({
    "status": "healthy",
    "services": state.providers.health(),
    "timestamp": Utc::now().to_rfc3339(),
  }))
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use agora_store_memory::MemoryStore;
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use tower::ServiceExt as _;

  use crate::providers::FileStore;

  fn make_state() -> AppState<MemoryStore> {
    AppState {
      store:    Arc::new(MemoryStore::new()),
      sessions: Arc::new(SessionStore::new()),
      providers: Arc::new(Providers {
        assistant: None,
        context:   None,
        notifier:  None,
        files:     FileStore::new(std::env::temp_dir()),
      }),
      config: Arc::new(ServerConfig::default()),
    }
  }

  async fn send(
    state: &AppState<MemoryStore>,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<serde_json::Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
      builder = builder.header(header::COOKIE, cookie);
    }
    let req = match body {
      Some(json) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    router(state.clone()).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn session_cookie_of(resp: &axum::response::Response) -> String {
    resp
      .headers()
      .get(header::SET_COOKIE)
      .unwrap()
      .to_str()
      .unwrap()
      .split(';')
      .next()
      .unwrap()
      .to_string()
  }

  /// Register a user and return their session cookie.
  async fn register(state: &AppState<MemoryStore>, username: &str) -> String {
    let resp = send(state, "POST", "/api/auth/register", None, Some(json!({
      "username": username,
      "email": format!("{username}@example.com"),
      "password": "secret",
      "name": username,
    })))
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    session_cookie_of(&resp)
  }

  // ── Auth ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_then_me_roundtrip() {
    let state = make_state();
    let cookie = register(&state, "alice").await;

    let resp = send(&state, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let user = body_json(resp).await;
    assert_eq!(user["username"], "alice");
    // The password hash never leaves the server.
    assert!(user.get("passwordHash").is_none());
  }

  #[tokio::test]
  async fn duplicate_username_is_a_conflict() {
    let state = make_state();
    register(&state, "alice").await;

    let resp = send(&state, "POST", "/api/auth/register", None, Some(json!({
      "username": "alice",
      "email": "other@example.com",
      "password": "secret",
      "name": "Alice",
    })))
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn login_with_wrong_password_is_unauthorized() {
    let state = make_state();
    register(&state, "alice").await;

    let resp = send(&state, "POST", "/api/auth/login", None, Some(json!({
      "username": "alice",
      "password": "wrong",
    })))
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn logout_revokes_the_session() {
    let state = make_state();
    let cookie = register(&state, "alice").await;

    send(&state, "POST", "/api/auth/logout", Some(&cookie), None).await;
    let resp = send(&state, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Forum ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn creating_a_post_requires_a_session() {
    let state = make_state();
    let resp = send(&state, "POST", "/api/forum/general/posts", None, Some(json!({
      "title": "t", "content": "c",
    })))
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn post_lifecycle_views_and_answers() {
    let state = make_state();
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;

    let resp = send(
      &state,
      "POST",
      "/api/forum/technical_support/posts",
      Some(&alice),
      Some(json!({ "title": "Setup help", "content": "VPN broken" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let post = body_json(resp).await;
    assert_eq!(post["views"], 0);
    let id = post["id"].as_i64().unwrap();

    // Each fetch counts a view.
    let detail = body_json(
      send(&state, "GET", &format!("/api/forum/posts/{id}"), None, None).await,
    )
    .await;
    assert_eq!(detail["post"]["views"], 1);
    assert_eq!(detail["post"]["isAnswered"], false);

    // First human answer flips the flag.
    let resp = send(
      &state,
      "POST",
      &format!("/api/forum/posts/{id}/comments"),
      Some(&bob),
      Some(json!({ "content": "restart the client" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let detail = body_json(
      send(&state, "GET", &format!("/api/forum/posts/{id}"), None, None).await,
    )
    .await;
    assert_eq!(detail["post"]["isAnswered"], true);
    assert_eq!(detail["comments"].as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn missing_post_is_not_found() {
    let state = make_state();
    let resp = send(&state, "GET", "/api/forum/posts/99", None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn category_listing_reports_pagination() {
    let state = make_state();
    let alice = register(&state, "alice").await;
    for i in 0..3 {
      send(
        &state,
        "POST",
        "/api/forum/general/posts",
        Some(&alice),
        Some(json!({ "title": format!("post {i}"), "content": "body" })),
      )
      .await;
    }

    let listing = body_json(
      send(&state, "GET", "/api/forum/general?page=1&limit=2", None, None).await,
    )
    .await;
    assert_eq!(listing["posts"].as_array().unwrap().len(), 2);
    assert_eq!(listing["pagination"]["total"], 3);
    assert_eq!(listing["pagination"]["pages"], 2);
  }

  #[tokio::test]
  async fn vote_endpoint_toggles_and_switches() {
    let state = make_state();
    let alice = register(&state, "alice").await;
    let post = body_json(
      send(
        &state,
        "POST",
        "/api/forum/general/posts",
        Some(&alice),
        Some(json!({ "title": "q", "content": "b" })),
      )
      .await,
    )
    .await;
    let uri = format!("/api/forum/posts/{}/votes", post["id"]);

    let resp =
      send(&state, "POST", &uri, Some(&alice), Some(json!({ "voteType": "upvote" }))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["message"], "upvote added");

    let resp =
      send(&state, "POST", &uri, Some(&alice), Some(json!({ "voteType": "downvote" }))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["message"], "changed to downvote");

    let resp =
      send(&state, "POST", &uri, Some(&alice), Some(json!({ "voteType": "downvote" }))).await;
    assert_eq!(body_json(resp).await["message"], "downvote removed");
  }

  #[tokio::test]
  async fn search_requires_a_query() {
    let state = make_state();
    let resp = send(&state, "GET", "/api/forum/search", None, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn search_finds_posts_by_content() {
    let state = make_state();
    let alice = register(&state, "alice").await;
    send(
      &state,
      "POST",
      "/api/forum/general/posts",
      Some(&alice),
      Some(json!({ "title": "Printer", "content": "the VPN is broken" })),
    )
    .await;

    let hits = body_json(
      send(&state, "GET", "/api/forum/search?q=vpn", None, None).await,
    )
    .await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
  }

  // ── Chats ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn chat_message_without_assistant_gets_fallback_reply() {
    let state = make_state();
    let alice = register(&state, "alice").await;

    let chat = body_json(
      send(&state, "POST", "/api/chats", Some(&alice), Some(json!({
        "category": "general",
      })))
      .await,
    )
    .await;
    let uri = format!("/api/chats/{}/messages", chat["id"]);

    let resp = send(&state, "POST", &uri, Some(&alice), Some(json!({
      "content": "what is the wifi password?",
    })))
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let reply = body_json(resp).await;
    assert_eq!(reply["isUserMessage"], false);

    // Both the question and the fallback reply are persisted.
    let detail = body_json(
      send(&state, "GET", &format!("/api/chats/{}", chat["id"]), Some(&alice), None).await,
    )
    .await;
    assert_eq!(detail["messages"].as_array().unwrap().len(), 2);
    assert_eq!(detail["messages"][0]["isUserMessage"], true);
  }

  // ── Documents ───────────────────────────────────────────────────────────

  fn multipart_body(boundary: &str) -> String {
    let mut body = String::new();
    for (name, value) in [
      ("name", "Handbook"),
      ("category", "hr"),
      ("documentType", "guide"),
    ] {
      body.push_str(&format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
      ));
    }
    body.push_str(&format!(
      "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
       filename=\"handbook.txt\"\r\nContent-Type: text/plain\r\n\r\nhello\r\n--{boundary}--\r\n"
    ));
    body
  }

  #[tokio::test]
  async fn document_upload_list_and_delete() {
    let state = make_state();
    let alice = register(&state, "alice").await;
    let boundary = "agora-test-boundary";

    let req = Request::builder()
      .method("POST")
      .uri("/api/documents")
      .header(header::COOKIE, &alice)
      .header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={boundary}"),
      )
      .body(Body::from(multipart_body(boundary)))
      .unwrap();
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let document = body_json(resp).await;
    assert_eq!(document["fileType"], "txt");
    assert_eq!(document["fileSize"], 5);
    // No context provider configured: the document stays pending.
    assert_eq!(document["status"], "pending");

    let listed = body_json(
      send(&state, "GET", "/api/documents?category=hr", Some(&alice), None).await,
    )
    .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let id = document["id"].as_i64().unwrap();
    let resp = send(
      &state,
      "DELETE",
      &format!("/api/documents/{id}"),
      Some(&alice),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(
      &state,
      "GET",
      &format!("/api/documents/{id}"),
      Some(&alice),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Status ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_reports_collaborator_availability() {
    let state = make_state();
    let resp = send(&state, "GET", "/health", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let health = body_json(resp).await;
    assert_eq!(health["services"]["assistant"], "unavailable");
  }
}
