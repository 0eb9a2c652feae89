//! Votes and the reconciliation outcome reported by the store.
//!
//! A vote always targets exactly one post or one comment. The store
//! enforces at-most-one-vote-per-user-per-target by reconciliation
//! (insert / toggle-off / switch), not by a uniqueness constraint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{comment::CommentId, post::PostId, user::UserId};

pub type VoteId = i64;

/// The post or comment a vote applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VoteTarget {
  Post {
    #[serde(rename = "postId")]
    post_id: PostId,
  },
  Comment {
    #[serde(rename = "commentId")]
    comment_id: CommentId,
  },
}

impl VoteTarget {
  pub fn post(post_id: PostId) -> Self {
    Self::Post { post_id }
  }

  pub fn comment(comment_id: CommentId) -> Self {
    Self::Comment { comment_id }
  }
}

impl std::fmt::Display for VoteTarget {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Post { post_id } => write!(f, "post {post_id}"),
      Self::Comment { comment_id } => write!(f, "comment {comment_id}"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
  Upvote,
  Downvote,
}

impl VoteType {
  /// Wire/display name, matching the serde tag.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Upvote => "upvote",
      Self::Downvote => "downvote",
    }
  }
}

/// A recorded vote row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
  pub id:         VoteId,
  pub user_id:    UserId,
  #[serde(flatten)]
  pub target:     VoteTarget,
  pub vote_type:  VoteType,
  pub created_at: DateTime<Utc>,
  pub updated_at: Option<DateTime<Utc>>,
}

/// What [`crate::store::ForumStore::reconcile_vote`] did with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteOutcome {
  /// No prior vote existed; a new one was inserted.
  Recorded,
  /// A prior vote of the other type existed; its type was switched in
  /// place.
  Switched,
  /// A prior vote of the same type existed; it was deleted.
  Retracted,
}
