//! Handlers for `/api/chats` endpoints.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use agora_core::{
  chat::{AiChat, AiChatMessage, NewAiChat, NewAiChatMessage},
  store::ForumStore,
};

use crate::{
  AppState, error::ApiError, providers::ChatTurn, session::CurrentUser,
};

/// Reply persisted when the assistant is unavailable or fails, so the
/// conversation still records that the question was asked.
const FALLBACK_REPLY: &str =
  "I'm sorry, I couldn't generate a response right now. Please try again later.";

// ─── Chats ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateChatBody {
  pub category: String,
}

/// `POST /api/chats`
pub async fn create_chat<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<CreateChatBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if body.category.is_empty() {
    return Err(ApiError::BadRequest("category is required".to_string()));
  }

  let chat = state
    .store
    .create_ai_chat(NewAiChat { user_id, category: body.category })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(chat)))
}

/// `GET /api/chats` — the current user's chats, newest first.
pub async fn list_chats<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<AiChat>>, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let chats = state
    .store
    .ai_chats_by_user(user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(chats))
}

#[derive(Debug, Serialize)]
pub struct ChatDetail {
  pub chat:     AiChat,
  pub messages: Vec<AiChatMessage>,
}

/// `GET /api/chats/{id}`
pub async fn get_chat<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  CurrentUser(_): CurrentUser,
) -> Result<Json<ChatDetail>, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let chat = state
    .store
    .get_ai_chat(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("chat not found".to_string()))?;
  let messages = state
    .store
    .ai_chat_messages(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ChatDetail { chat, messages }))
}

// ─── Messages ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateMessageBody {
  pub content: String,
}

/// `POST /api/chats/{id}/messages`
///
/// The user's message is always persisted; generation failures are
/// replaced by a persisted fallback reply so the request still succeeds.
pub async fn create_message<S>(
  State(state): State<AppState<S>>,
  Path(chat_id): Path<i64>,
  CurrentUser(_): CurrentUser,
  Json(body): Json<CreateMessageBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let chat = state
    .store
    .get_ai_chat(chat_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("chat not found".to_string()))?;

  if body.content.is_empty() {
    return Err(ApiError::BadRequest("content is required".to_string()));
  }

  // History gathered before the new turn is appended.
  let mut history: Vec<ChatTurn> = state
    .store
    .ai_chat_messages(chat_id)
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .map(|m| {
      if m.is_user_message {
        ChatTurn::user(m.content)
      } else {
        ChatTurn::assistant(m.content)
      }
    })
    .collect();
  history.push(ChatTurn::user(body.content.clone()));

  state
    .store
    .create_ai_chat_message(NewAiChatMessage {
      chat_id,
      content: body.content.clone(),
      is_user_message: true,
    })
    .await
    .map_err(ApiError::store)?;

  let context = state.providers.context_for(&body.content, &chat.category).await;

  let reply = match &state.providers.assistant {
    Some(assistant) => assistant
      .generate(&body.content, &history, &chat.category, context.as_deref())
      .await
      .unwrap_or_else(|error| {
        tracing::warn!(%error, chat_id, "assistant reply failed");
        FALLBACK_REPLY.to_string()
      }),
    None => FALLBACK_REPLY.to_string(),
  };

  let ai_message = state
    .store
    .create_ai_chat_message(NewAiChatMessage {
      chat_id,
      content: reply.clone(),
      is_user_message: false,
    })
    .await
    .map_err(ApiError::store)?;

  state
    .providers
    .notify(&format!(
      "*AI Chat Question:* {}\n\n*AI Response:* {reply}",
      body.content
    ))
    .await;

  Ok((StatusCode::CREATED, Json(ai_message)))
}
