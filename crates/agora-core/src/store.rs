//! The `ForumStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `agora-store-memory`). The HTTP layer depends on this abstraction,
//! not on any concrete backend.
//!
//! Contract notes, shared by all implementations:
//!
//! - Every `get_*` returns `Ok(None)` for an unknown id — absence is a
//!   valid, non-error outcome; callers translate it into a not-found
//!   response.
//! - Ids and `created_at` are always assigned by the store; callers never
//!   supply them.
//! - Uniqueness checks (username, email) are the caller's
//!   responsibility. The store does not self-check on `create_user`.

use std::future::Future;

use crate::{
  chat::{AiChat, AiChatMessage, ChatId, NewAiChat, NewAiChatMessage},
  comment::{Comment, CommentId, NewComment},
  document::{Document, DocumentId, DocumentUpdate, NewDocument},
  post::{NewPost, Post, PostId, PostQuery, PostUpdate},
  user::{NewUser, User, UserId},
  vote::{Vote, VoteOutcome, VoteTarget, VoteType},
};

/// Abstraction over an Agora storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ForumStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create a user with the next id. Duplicate checking is the caller's
  /// job; the store happily stores whatever it is given.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Create a post with views = 0 and both answer flags false. The
  /// author summary is attached at creation time.
  fn create_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Fetch a post, back-filling the author summary and comment count.
  fn get_post(
    &self,
    id: PostId,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Merge the present fields of `update` and stamp `updated_at`.
  /// Returns `None` if the id is unknown.
  fn update_post(
    &self,
    id: PostId,
    update: PostUpdate,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Filter by exact category, order per `query.sort`, then slice the
  /// 1-indexed page. Out-of-range pages yield an empty slice.
  fn posts_by_category<'a>(
    &'a self,
    category: &'a str,
    query: PostQuery,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + 'a;

  /// Total posts in a category, for `ceil(total / limit)` page counts.
  fn count_posts_by_category<'a>(
    &'a self,
    category: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Case-insensitive substring match over title OR content. Results
  /// come back in id order, not relevance order.
  fn search_posts<'a>(
    &'a self,
    query: &'a str,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + 'a;

  /// [`Self::search_posts`] restricted to one category.
  fn search_posts_in_category<'a>(
    &'a self,
    query: &'a str,
    category: &'a str,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + 'a;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Create a comment with zeroed tallies and the author summary
  /// attached.
  fn create_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    id: CommentId,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// All comments on a post, oldest first, author summaries back-filled.
  fn comments_by_post(
    &self,
    post_id: PostId,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  /// Recount a comment's tallies from the live vote set and overwrite
  /// its counters. A no-op for an unknown id.
  fn refresh_comment_votes(
    &self,
    id: CommentId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Recount a post's tallies from the live vote set. Posts and comments
  /// are treated symmetrically.
  fn refresh_post_votes(
    &self,
    id: PostId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// Reconcile a vote request against any existing vote for
  /// `(user_id, target)`:
  ///
  /// - no existing vote → insert ([`VoteOutcome::Recorded`]);
  /// - existing vote of the same type → delete it
  ///   ([`VoteOutcome::Retracted`]);
  /// - existing vote of the other type → switch it in place
  ///   ([`VoteOutcome::Switched`]).
  ///
  /// Idempotent under repetition: the same request twice in a row nets
  /// out to zero votes for the pair. The target's tallies are recounted
  /// after every outcome. Errors if the target does not exist.
  fn reconcile_vote(
    &self,
    user_id: UserId,
    target: VoteTarget,
    vote_type: VoteType,
  ) -> impl Future<Output = Result<VoteOutcome, Self::Error>> + Send + '_;

  /// The current vote for `(user_id, target)`, if any.
  fn vote_for(
    &self,
    user_id: UserId,
    target: VoteTarget,
  ) -> impl Future<Output = Result<Option<Vote>, Self::Error>> + Send + '_;

  // ── AI chats ──────────────────────────────────────────────────────────

  fn create_ai_chat(
    &self,
    input: NewAiChat,
  ) -> impl Future<Output = Result<AiChat, Self::Error>> + Send + '_;

  fn get_ai_chat(
    &self,
    id: ChatId,
  ) -> impl Future<Output = Result<Option<AiChat>, Self::Error>> + Send + '_;

  /// A user's chats, newest first, each with a last-message preview.
  fn ai_chats_by_user(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Vec<AiChat>, Self::Error>> + Send + '_;

  fn create_ai_chat_message(
    &self,
    input: NewAiChatMessage,
  ) -> impl Future<Output = Result<AiChatMessage, Self::Error>> + Send + '_;

  /// All messages of a chat in conversation order (oldest first).
  fn ai_chat_messages(
    &self,
    chat_id: ChatId,
  ) -> impl Future<Output = Result<Vec<AiChatMessage>, Self::Error>> + Send + '_;

  // ── Documents ─────────────────────────────────────────────────────────

  /// Create a document in `Pending` status with the uploader summary
  /// attached.
  fn create_document(
    &self,
    input: NewDocument,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_;

  fn get_document(
    &self,
    id: DocumentId,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  fn update_document(
    &self,
    id: DocumentId,
    update: DocumentUpdate,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// Documents in a category, newest first.
  fn documents_by_category<'a>(
    &'a self,
    category: &'a str,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + 'a;

  /// Every document, newest first.
  fn all_documents(
    &self,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;

  /// Hard delete with no tombstone. Returns whether the id existed.
  fn delete_document(
    &self,
    id: DocumentId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
