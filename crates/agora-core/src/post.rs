//! Forum posts and their query/update types.
//!
//! A post's `user`, `comment_count` and vote tallies are derived fields:
//! the store back-fills them on read (or, for tallies, recomputes them
//! after each vote mutation). They are never accepted from callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::{UserId, UserSummary};

pub type PostId = i64;

/// A forum post, as returned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
  pub id:         PostId,
  pub title:      String,
  pub content:    String,
  pub user_id:    UserId,
  pub category:   String,
  #[serde(default)]
  pub tags:       Vec<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: Option<DateTime<Utc>>,
  pub views:      u32,
  pub is_answered:   bool,
  pub has_ai_answer: bool,
  /// Derived from the live vote set; see
  /// [`crate::store::ForumStore::refresh_post_votes`].
  pub upvotes:    u32,
  pub downvotes:  u32,
  /// Denormalised author summary, back-filled on read. `None` when the
  /// author id is unknown to the store.
  pub user:       Option<UserSummary>,
  /// Number of comments on this post, recomputed on read.
  pub comment_count: u32,
}

/// Input to [`crate::store::ForumStore::create_post`]. Views, flags and
/// tallies always start at their zero values.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
  pub title:    String,
  pub content:  String,
  pub user_id:  UserId,
  pub category: String,
  #[serde(default)]
  pub tags:     Vec<String>,
}

/// The fields of a post that are legitimately mutable. Everything absent
/// is left untouched; any present field overwrites and stamps
/// `updated_at`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdate {
  pub title:   Option<String>,
  pub content: Option<String>,
  pub views:   Option<u32>,
  pub is_answered:   Option<bool>,
  pub has_ai_answer: Option<bool>,
}

/// Ordering applied by [`crate::store::ForumStore::posts_by_category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostSort {
  /// Newest first.
  #[default]
  Recent,
  /// Most viewed first.
  Popular,
  /// Only posts nobody has answered, newest first.
  Unanswered,
}

/// Pagination and ordering for a category listing. Pages are 1-indexed;
/// an out-of-range page yields an empty slice, never an error.
#[derive(Debug, Clone, Copy)]
pub struct PostQuery {
  pub page:  u32,
  pub limit: u32,
  pub sort:  PostSort,
}

impl Default for PostQuery {
  fn default() -> Self {
    Self { page: 1, limit: 10, sort: PostSort::Recent }
  }
}
