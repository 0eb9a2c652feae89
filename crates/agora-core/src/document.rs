//! Uploaded documents and their embedding lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::{UploaderSummary, UserId};

pub type DocumentId = i64;

/// Where a document is in the embedding pipeline. The transition out of
/// `Pending` happens after the (external) embedding step completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
  #[default]
  Pending,
  Processed,
  Failed,
}

/// An uploaded document. The store records only metadata; the bytes live
/// wherever the file-storage collaborator put them (`file_path`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
  pub id:          DocumentId,
  pub name:        String,
  pub description: Option<String>,
  /// Original file extension, e.g. `pdf`.
  pub file_type:   String,
  pub file_size:   u64,
  pub category:    String,
  pub document_type: String,
  pub file_path:   String,
  pub uploaded_by_id: UserId,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  Option<DateTime<Utc>>,
  pub status:      DocumentStatus,
  /// Id assigned by the vector store once the document is processed.
  pub embedding_id: Option<String>,
  /// Denormalised uploader summary, back-filled on read.
  pub uploaded_by: Option<UploaderSummary>,
}

/// Input to [`crate::store::ForumStore::create_document`]. Status always
/// starts at `Pending`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
  pub name:        String,
  pub description: Option<String>,
  pub file_type:   String,
  pub file_size:   u64,
  pub category:    String,
  pub document_type: String,
  pub file_path:   String,
  pub uploaded_by_id: UserId,
}

/// The fields of a document that are legitimately mutable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdate {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub category:    Option<String>,
  pub document_type: Option<String>,
  pub status:      Option<DocumentStatus>,
  pub embedding_id: Option<String>,
}
