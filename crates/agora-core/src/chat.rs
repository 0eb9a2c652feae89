//! AI chat sessions and their messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;

pub type ChatId = i64;
pub type ChatMessageId = i64;

/// Maximum characters of a message shown in a chat-list preview.
pub const PREVIEW_LEN: usize = 50;

/// A chat session between a user and the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiChat {
  pub id:         ChatId,
  pub user_id:    UserId,
  pub category:   String,
  pub created_at: DateTime<Utc>,
  /// Preview of the most recent message, computed when listing chats.
  pub last_message: Option<MessagePreview>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAiChat {
  pub user_id:  UserId,
  pub category: String,
}

/// One turn of a chat. `is_user_message` distinguishes the human side
/// from assistant replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiChatMessage {
  pub id:         ChatMessageId,
  pub chat_id:    ChatId,
  pub content:    String,
  pub is_user_message: bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAiChatMessage {
  pub chat_id: ChatId,
  pub content: String,
  pub is_user_message: bool,
}

/// The truncated last-message summary attached to listed chats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePreview {
  pub content:    String,
  pub created_at: DateTime<Utc>,
  pub is_user_message: bool,
}

impl MessagePreview {
  /// Build a preview from a message, truncating the content to
  /// [`PREVIEW_LEN`] characters plus an ellipsis. Truncation counts
  /// characters, not bytes, so multi-byte content never splits.
  pub fn of(message: &AiChatMessage) -> Self {
    let content = if message.content.chars().count() > PREVIEW_LEN {
      let truncated: String = message.content.chars().take(PREVIEW_LEN).collect();
      format!("{truncated}...")
    } else {
      message.content.clone()
    };
    Self {
      content,
      created_at: message.created_at,
      is_user_message: message.is_user_message,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn message(content: &str) -> AiChatMessage {
    AiChatMessage {
      id:         1,
      chat_id:    1,
      content:    content.to_string(),
      is_user_message: true,
      created_at: Utc::now(),
    }
  }

  #[test]
  fn short_content_is_untouched() {
    let preview = MessagePreview::of(&message("hello"));
    assert_eq!(preview.content, "hello");
  }

  #[test]
  fn long_content_is_truncated_with_ellipsis() {
    let long = "x".repeat(80);
    let preview = MessagePreview::of(&message(&long));
    assert_eq!(preview.content, format!("{}...", "x".repeat(50)));
  }

  #[test]
  fn exactly_preview_len_is_untouched() {
    let exact = "y".repeat(50);
    let preview = MessagePreview::of(&message(&exact));
    assert_eq!(preview.content, exact);
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    let long = "é".repeat(60);
    let preview = MessagePreview::of(&message(&long));
    assert_eq!(preview.content, format!("{}...", "é".repeat(50)));
  }
}
