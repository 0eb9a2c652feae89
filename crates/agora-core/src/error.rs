//! Error types for `agora-core`.
//!
//! The taxonomy is deliberately small: lookups by id report absence with
//! `Option`, not an error, so callers decide the response code. The store
//! only errors when an operation cannot proceed at all.

use thiserror::Error;

use crate::vote::VoteTarget;

#[derive(Debug, Error)]
pub enum Error {
  /// A vote was recorded against a post or comment that does not exist.
  /// Callers must verify the target before reconciling.
  #[error("vote target does not exist: {0}")]
  MissingVoteTarget(VoteTarget),

  #[error("username already taken: {0:?}")]
  DuplicateUsername(String),

  #[error("email already registered: {0:?}")]
  DuplicateEmail(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
