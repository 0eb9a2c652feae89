//! Comments attached to forum posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  post::PostId,
  user::{UserId, UserSummary},
};

pub type CommentId = i64;

/// A comment on a post. `upvotes`/`downvotes` are derived — recomputed
/// from the vote set by the store, never incremented directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub id:         CommentId,
  pub content:    String,
  pub post_id:    PostId,
  pub user_id:    UserId,
  pub created_at: DateTime<Utc>,
  pub updated_at: Option<DateTime<Utc>>,
  pub upvotes:    u32,
  pub downvotes:  u32,
  pub is_ai_generated: bool,
  /// Denormalised author summary, back-filled on read.
  pub user:       Option<UserSummary>,
}

/// Input to [`crate::store::ForumStore::create_comment`]. Tallies always
/// start at zero.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
  pub content: String,
  pub post_id: PostId,
  pub user_id: UserId,
  #[serde(default)]
  pub is_ai_generated: bool,
}
