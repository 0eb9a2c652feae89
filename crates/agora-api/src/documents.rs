//! Handlers for `/api/documents` endpoints.
//!
//! Upload writes the bytes through the file-storage collaborator, records
//! the metadata as `Pending`, then runs the embedding step: `Processed`
//! with an embedding id on success, `Failed` on error. Without a context
//! provider the document simply stays `Pending`.

use axum::{
  Json,
  extract::{Multipart, Path, Query, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use agora_core::{
  document::{Document, DocumentStatus, DocumentUpdate, NewDocument},
  store::ForumStore,
};

use crate::{AppState, error::ApiError, providers::FileStore, session::CurrentUser};

// ─── Upload ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct UploadForm {
  file:          Option<(String, bytes::Bytes)>,
  name:          Option<String>,
  description:   Option<String>,
  category:      Option<String>,
  document_type: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
  let mut form = UploadForm::default();
  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(e.to_string()))?
  {
    let name = field.name().unwrap_or_default().to_string();
    match name.as_str() {
      "file" => {
        let filename = field
          .file_name()
          .ok_or_else(|| ApiError::BadRequest("no file selected".to_string()))?
          .to_string();
        let bytes = field
          .bytes()
          .await
          .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        form.file = Some((filename, bytes));
      }
      "name" => form.name = field.text().await.ok(),
      "description" => form.description = field.text().await.ok(),
      "category" => form.category = field.text().await.ok(),
      "documentType" => form.document_type = field.text().await.ok(),
      _ => {}
    }
  }
  Ok(form)
}

/// `POST /api/documents` — multipart upload.
pub async fn upload<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let form = read_form(multipart).await?;

  let (filename, bytes) = form
    .file
    .ok_or_else(|| ApiError::BadRequest("file is required".to_string()))?;
  if FileStore::allowed_extension(&filename).is_none() {
    return Err(ApiError::BadRequest(
      "invalid file type: only document files are allowed".to_string(),
    ));
  }

  let (name, category, document_type) =
    match (form.name, form.category, form.document_type) {
      (Some(n), Some(c), Some(d)) if !n.is_empty() && !c.is_empty() && !d.is_empty() => {
        (n, c, d)
      }
      _ => {
        return Err(ApiError::BadRequest(
          "name, category, and document type are required".to_string(),
        ));
      }
    };

  let stored = state
    .providers
    .files
    .save(&filename, bytes)
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;

  let document = state
    .store
    .create_document(NewDocument {
      name,
      description: form.description.filter(|d| !d.is_empty()),
      file_type:   stored.extension,
      file_size:   stored.size,
      category,
      document_type,
      file_path:   stored.path,
      uploaded_by_id: user_id,
    })
    .await
    .map_err(ApiError::store)?;

  embed_document(&state, &document).await;

  let document = state
    .store
    .get_document(document.id)
    .await
    .map_err(ApiError::store)?
    .unwrap_or(document);
  Ok((StatusCode::CREATED, Json(document)))
}

/// Run the embedding step for a freshly uploaded document and record the
/// outcome. Skipped entirely when no context provider is configured.
async fn embed_document<S>(state: &AppState<S>, document: &Document)
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let Some(context) = &state.providers.context else {
    return;
  };

  let update = match context.index_document(document).await {
    Ok(embedding_id) => DocumentUpdate {
      status: Some(DocumentStatus::Processed),
      embedding_id: Some(embedding_id),
      ..Default::default()
    },
    Err(error) => {
      tracing::warn!(%error, document_id = document.id, "document embedding failed");
      DocumentUpdate {
        status: Some(DocumentStatus::Failed),
        ..Default::default()
      }
    }
  };

  if let Err(error) = state.store.update_document(document.id, update).await {
    tracing::error!(%error, document_id = document.id, "failed to record embedding outcome");
  }
}

// ─── Listing and retrieval ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub category: Option<String>,
}

/// `GET /api/documents[?category=]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(_): CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Document>>, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let documents = match params.category {
    Some(category) => state
      .store
      .documents_by_category(&category)
      .await
      .map_err(ApiError::store)?,
    None => state.store.all_documents().await.map_err(ApiError::store)?,
  };
  Ok(Json(documents))
}

/// `GET /api/documents/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  CurrentUser(_): CurrentUser,
) -> Result<Json<Document>, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let document = state
    .store
    .get_document(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("document not found".to_string()))?;
  Ok(Json(document))
}

/// `GET /api/documents/{id}/download`
pub async fn download<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  CurrentUser(_): CurrentUser,
) -> Result<impl IntoResponse, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let document = state
    .store
    .get_document(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("document not found".to_string()))?;

  let bytes = tokio::fs::read(&document.file_path)
    .await
    .map_err(|_| ApiError::NotFound("file not found".to_string()))?;

  let disposition = format!(
    "attachment; filename=\"{}.{}\"",
    document.name, document.file_type
  );
  Ok((
    [
      (header::CONTENT_TYPE, "application/octet-stream".to_string()),
      (header::CONTENT_DISPOSITION, disposition),
    ],
    bytes,
  ))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /api/documents/{id}` — hard delete. The stored file and any
/// embedding are removed best-effort; the record always goes.
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  CurrentUser(_): CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let document = state
    .store
    .get_document(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("document not found".to_string()))?;

  state.providers.files.delete(&document.file_path).await;

  if let (Some(embedding_id), Some(context)) =
    (&document.embedding_id, &state.providers.context)
    && let Err(error) = context.delete_document(embedding_id, &document.category).await
  {
    tracing::warn!(%error, document_id = id, "failed to delete embedding");
  }

  state.store.delete_document(id).await.map_err(ApiError::store)?;
  Ok(Json(json!({ "message": "document deleted" })))
}
