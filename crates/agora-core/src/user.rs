//! User accounts and the denormalised summaries embedded in other entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;

/// Reserved account that authors AI-generated comments. Seeded by the store
/// at construction; regular accounts start at id 2.
pub const SYSTEM_USER_ID: UserId = 1;

/// A registered forum account.
///
/// `password_hash` is an argon2 PHC string and is never serialised; the
/// system user carries an empty hash so it can never authenticate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:         UserId,
  pub username:   String,
  pub email:      String,
  pub name:       String,
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub avatar:     Option<String>,
  pub department: Option<String>,
  pub job_title:  Option<String>,
  pub created_at: DateTime<Utc>,
}

impl User {
  /// The summary embedded in posts and comments.
  pub fn summary(&self) -> UserSummary {
    UserSummary {
      id:        self.id,
      username:  self.username.clone(),
      name:      self.name.clone(),
      avatar:    self.avatar.clone(),
      job_title: self.job_title.clone(),
    }
  }

  /// The narrower summary embedded in documents.
  pub fn uploader_summary(&self) -> UploaderSummary {
    UploaderSummary {
      id:       self.id,
      username: self.username.clone(),
      name:     self.name.clone(),
    }
  }
}

/// Input to [`crate::store::ForumStore::create_user`].
/// `id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
  pub username:   String,
  pub email:      String,
  pub name:       String,
  pub password_hash: String,
  pub avatar:     Option<String>,
  pub department: Option<String>,
  pub job_title:  Option<String>,
}

/// A small copy of a user's display fields, embedded in read
/// representations to avoid a join at display time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
  pub id:        UserId,
  pub username:  String,
  pub name:      String,
  pub avatar:    Option<String>,
  pub job_title: Option<String>,
}

/// Who uploaded a document; narrower than [`UserSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploaderSummary {
  pub id:       UserId,
  pub username: String,
  pub name:     String,
}
