//! Clients for the external collaborators: text generation, context
//! retrieval over document embeddings, team-chat notification, and file
//! storage.
//!
//! Each network collaborator is optional at runtime; the forum works
//! without them, it just stops producing AI answers, context, or
//! notifications. Collaborator failures are logged by the callers and
//! never abort the request that triggered them.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context as _, Result};
use bytes::Bytes;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use agora_core::document::Document;

/// File extensions accepted for document upload.
pub const ALLOWED_EXTENSIONS: &[&str] =
  &["txt", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "md"];

fn http_client() -> Result<Client> {
  Client::builder()
    .timeout(Duration::from_secs(30))
    .build()
    .context("failed to build HTTP client")
}

// ─── Conversation history ────────────────────────────────────────────────────

/// One turn of conversation history passed to the assistant.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
  pub role:    &'static str,
  pub content: String,
}

impl ChatTurn {
  pub fn user(content: String) -> Self {
    Self { role: "user", content }
  }

  pub fn assistant(content: String) -> Self {
    Self { role: "assistant", content }
  }
}

// ─── Assistant ───────────────────────────────────────────────────────────────

/// Client for the text-generation provider.
#[derive(Clone)]
pub struct AssistantClient {
  client:   Client,
  base_url: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  reply: String,
}

impl AssistantClient {
  pub fn new(base_url: String) -> Result<Self> {
    Ok(Self { client: http_client()?, base_url })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.base_url.trim_end_matches('/'))
  }

  /// Ask the provider for a reply to `query`, given conversation history,
  /// the forum category, and optional retrieved context.
  pub async fn generate(
    &self,
    query: &str,
    history: &[ChatTurn],
    category: &str,
    context: Option<&str>,
  ) -> Result<String> {
    let response = self
      .client
      .post(self.url("/generate"))
      .json(&serde_json::json!({
        "query": query,
        "history": history,
        "category": category,
        "context": context,
      }))
      .send()
      .await
      .context("POST /generate failed")?
      .error_for_status()
      .context("assistant returned an error status")?
      .json::<GenerateResponse>()
      .await
      .context("assistant reply was not valid JSON")?;
    Ok(response.reply)
  }
}

// ─── Context source ──────────────────────────────────────────────────────────

/// Client for the embedding/vector-store provider. Also responsible for
/// indexing uploaded documents and dropping their embeddings on delete.
#[derive(Clone)]
pub struct ContextClient {
  client:   Client,
  base_url: String,
}

#[derive(Debug, Deserialize)]
struct ContextResponse {
  context: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexResponse {
  embedding_id: String,
}

impl ContextClient {
  pub fn new(base_url: String) -> Result<Self> {
    Ok(Self { client: http_client()?, base_url })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.base_url.trim_end_matches('/'))
  }

  /// Retrieve a context string for a query. `None` when no relevant
  /// documents exist — never required for correctness of core CRUD.
  pub async fn context_for(&self, query: &str, category: &str) -> Result<Option<String>> {
    let response = self
      .client
      .post(self.url("/context"))
      .json(&serde_json::json!({ "query": query, "category": category }))
      .send()
      .await
      .context("POST /context failed")?
      .error_for_status()
      .context("context provider returned an error status")?
      .json::<ContextResponse>()
      .await
      .context("context reply was not valid JSON")?;
    Ok(response.context)
  }

  /// Index an uploaded document and return its embedding id.
  pub async fn index_document(&self, document: &Document) -> Result<String> {
    let response = self
      .client
      .post(self.url("/documents"))
      .json(&serde_json::json!({
        "id": document.id,
        "name": document.name,
        "description": document.description,
        "category": document.category,
        "documentType": document.document_type,
        "filePath": document.file_path,
      }))
      .send()
      .await
      .context("POST /documents failed")?
      .error_for_status()
      .context("context provider rejected the document")?
      .json::<IndexResponse>()
      .await
      .context("index reply was not valid JSON")?;
    Ok(response.embedding_id)
  }

  /// Drop a document's embedding.
  pub async fn delete_document(&self, embedding_id: &str, category: &str) -> Result<()> {
    self
      .client
      .delete(self.url(&format!("/documents/{embedding_id}")))
      .query(&[("category", category)])
      .send()
      .await
      .context("DELETE /documents failed")?
      .error_for_status()
      .context("context provider rejected the delete")?;
    Ok(())
  }
}

// ─── Notifier ────────────────────────────────────────────────────────────────

/// Fire-and-forget webhook notifier (Slack-style incoming webhook).
#[derive(Clone)]
pub struct WebhookNotifier {
  client:      Client,
  webhook_url: String,
}

impl WebhookNotifier {
  pub fn new(webhook_url: String) -> Result<Self> {
    Ok(Self { client: http_client()?, webhook_url })
  }

  /// Best-effort send. Failures are logged here and never propagated.
  pub async fn notify(&self, text: &str) {
    let result = self
      .client
      .post(&self.webhook_url)
      .json(&serde_json::json!({ "text": text }))
      .send()
      .await
      .and_then(|r| r.error_for_status());
    if let Err(error) = result {
      tracing::warn!(%error, "webhook notification failed");
    }
  }
}

// ─── File storage ────────────────────────────────────────────────────────────

/// Metadata for a stored upload; the store records exactly this.
#[derive(Debug, Clone)]
pub struct StoredFile {
  pub path:      String,
  pub extension: String,
  pub size:      u64,
}

/// Writes uploads under a configured directory.
pub struct FileStore {
  root: PathBuf,
}

impl FileStore {
  pub fn new(root: PathBuf) -> Self {
    Self { root }
  }

  /// The allowed extension of `filename`, lowercased, if it has one.
  pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    let extension = extension.to_lowercase();
    ALLOWED_EXTENSIONS.contains(&extension.as_str()).then_some(extension)
  }

  /// Persist an upload. The stored name is timestamp-prefixed and
  /// sanitised so uploads cannot collide or escape the root.
  pub async fn save(&self, original_name: &str, bytes: Bytes) -> Result<StoredFile> {
    let extension = Self::allowed_extension(original_name)
      .context("file type not allowed")?;
    let safe_name: String = original_name
      .chars()
      .map(|c| {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
          c
        } else {
          '_'
        }
      })
      .collect();
    let stored_name = format!("{}_{safe_name}", Utc::now().timestamp());
    let path = self.root.join(stored_name);

    let size = bytes.len() as u64;
    tokio::fs::write(&path, &bytes)
      .await
      .with_context(|| format!("failed to write upload to {path:?}"))?;

    Ok(StoredFile {
      path: path.to_string_lossy().into_owned(),
      extension,
      size,
    })
  }

  /// Best-effort delete of a stored file.
  pub async fn delete(&self, path: &str) {
    if let Err(error) = tokio::fs::remove_file(path).await {
      tracing::warn!(%error, path, "failed to delete stored file");
    }
  }
}

// ─── Bundle ──────────────────────────────────────────────────────────────────

/// All collaborators, as configured for this process.
pub struct Providers {
  pub assistant: Option<AssistantClient>,
  pub context:   Option<ContextClient>,
  pub notifier:  Option<WebhookNotifier>,
  pub files:     FileStore,
}

impl Providers {
  /// Service availability, as reported by the health endpoint.
  pub fn health(&self) -> serde_json::Value {
    fn status(available: bool) -> &'static str {
      if available { "healthy" } else { "unavailable" }
    }
    serde_json::json!({
      "assistant": status(self.assistant.is_some()),
      "contextStore": status(self.context.is_some()),
      "notifier": status(self.notifier.is_some()),
    })
  }

  /// Fetch context for a query, logging (not propagating) failures.
  pub async fn context_for(&self, query: &str, category: &str) -> Option<String> {
    let context = self.context.as_ref()?;
    match context.context_for(query, category).await {
      Ok(context) => context,
      Err(error) => {
        tracing::warn!(%error, category, "context retrieval failed");
        None
      }
    }
  }

  /// Notify the team channel, if a webhook is configured.
  pub async fn notify(&self, text: &str) {
    if let Some(notifier) = &self.notifier {
      notifier.notify(text).await;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extension_allow_list() {
    assert_eq!(FileStore::allowed_extension("report.PDF").as_deref(), Some("pdf"));
    assert_eq!(FileStore::allowed_extension("notes.md").as_deref(), Some("md"));
    assert_eq!(FileStore::allowed_extension("script.exe"), None);
    assert_eq!(FileStore::allowed_extension("no-extension"), None);
  }

  #[tokio::test]
  async fn save_sanitises_names_and_reports_size() {
    let root = std::env::temp_dir();
    let files = FileStore::new(root);
    let stored = files
      .save("weird name?.txt", Bytes::from_static(b"hello"))
      .await
      .unwrap();

    assert_eq!(stored.extension, "txt");
    assert_eq!(stored.size, 5);
    assert!(stored.path.ends_with("weird_name_.txt"));
    assert_eq!(tokio::fs::read(&stored.path).await.unwrap(), b"hello");

    files.delete(&stored.path).await;
  }
}
