//! Handlers for `/api/forum` endpoints: category listings, posts,
//! comments, votes, and search.
//!
//! Existence checks happen here before any vote is reconciled, and the
//! answered/AI flags are flipped here — the store only records what this
//! layer decides.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use agora_core::{
  SYSTEM_USER_ID,
  comment::{Comment, NewComment},
  post::{NewPost, Post, PostQuery, PostSort, PostUpdate},
  store::ForumStore,
  vote::{VoteOutcome, VoteTarget, VoteType},
};

use crate::{
  AppState, error::ApiError, providers::ChatTurn, session::CurrentUser,
};

// ─── Category listing ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub page:    Option<u32>,
  pub limit:   Option<u32>,
  pub sort_by: Option<PostSort>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
  pub page:  u32,
  pub limit: u32,
  pub total: u64,
  pub pages: u64,
}

#[derive(Debug, Serialize)]
pub struct CategoryListing {
  pub posts:      Vec<Post>,
  pub pagination: Pagination,
}

/// `GET /api/forum/{category}?page=&limit=&sortBy=`
pub async fn list_category<S>(
  State(state): State<AppState<S>>,
  Path(category): Path<String>,
  Query(params): Query<ListParams>,
) -> Result<Json<CategoryListing>, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let query = PostQuery {
    page:  params.page.unwrap_or(1).max(1),
    limit: params.limit.unwrap_or(10).max(1),
    sort:  params.sort_by.unwrap_or_default(),
  };

  let posts = state
    .store
    .posts_by_category(&category, query)
    .await
    .map_err(ApiError::store)?;
  let total = state
    .store
    .count_posts_by_category(&category)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(CategoryListing {
    posts,
    pagination: Pagination {
      page:  query.page,
      limit: query.limit,
      total,
      pages: total.div_ceil(query.limit as u64),
    },
  }))
}

// ─── Post creation ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreatePostBody {
  pub title:   String,
  pub content: String,
  #[serde(default)]
  pub tags:    Vec<String>,
}

/// `POST /api/forum/{category}/posts`
///
/// The post is persisted first; the assistant answer is strictly
/// best-effort and a provider failure never fails the request.
pub async fn create_post<S>(
  State(state): State<AppState<S>>,
  Path(category): Path<String>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<CreatePostBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if body.title.is_empty() {
    return Err(ApiError::BadRequest("title is required".to_string()));
  }
  if body.content.is_empty() {
    return Err(ApiError::BadRequest("content is required".to_string()));
  }

  let post = state
    .store
    .create_post(NewPost {
      title:    body.title,
      content:  body.content,
      user_id,
      category: category.clone(),
      tags:     body.tags,
    })
    .await
    .map_err(ApiError::store)?;

  answer_post(&state, &post).await;

  // Re-read so the response reflects any AI answer just attached.
  let post = state
    .store
    .get_post(post.id)
    .await
    .map_err(ApiError::store)?
    .unwrap_or(post);
  Ok((StatusCode::CREATED, Json(post)))
}

/// Generate and attach an assistant answer to a fresh post, if a
/// text-generation provider is configured. Failures are logged only.
async fn answer_post<S>(state: &AppState<S>, post: &Post)
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let Some(assistant) = &state.providers.assistant else {
    return;
  };

  let question = format!("{}\n{}", post.title, post.content);
  let context = state
    .providers
    .context_for(&format!("{} {}", post.title, post.content), &post.category)
    .await;
  let history = vec![ChatTurn::user(question)];

  let reply = match assistant
    .generate(&post.content, &history, &post.category, context.as_deref())
    .await
  {
    Ok(reply) => reply,
    Err(error) => {
      tracing::warn!(%error, post_id = post.id, "assistant answer failed");
      return;
    }
  };

  let attached = async {
    state
      .store
      .create_comment(NewComment {
        content: reply,
        post_id: post.id,
        user_id: SYSTEM_USER_ID,
        is_ai_generated: true,
      })
      .await?;
    state
      .store
      .update_post(post.id, PostUpdate {
        has_ai_answer: Some(true),
        ..Default::default()
      })
      .await?;
    Ok::<(), S::Error>(())
  }
  .await;

  if let Err(error) = attached {
    tracing::error!(%error, post_id = post.id, "failed to attach assistant answer");
  }
}

// ─── Post detail ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PostDetail {
  pub post:     Post,
  pub comments: Vec<Comment>,
}

/// `GET /api/forum/posts/{id}` — also counts the view.
pub async fn get_post<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<PostDetail>, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let post = state
    .store
    .get_post(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("post not found".to_string()))?;

  let post = state
    .store
    .update_post(id, PostUpdate {
      views: Some(post.views + 1),
      ..Default::default()
    })
    .await
    .map_err(ApiError::store)?
    .unwrap_or(post);

  let comments = state
    .store
    .comments_by_post(id)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(PostDetail { post, comments }))
}

// ─── Comments ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateCommentBody {
  pub content: String,
}

/// `POST /api/forum/posts/{id}/comments`
///
/// The first human answer flips `is_answered`; the flag never reverts.
pub async fn create_comment<S>(
  State(state): State<AppState<S>>,
  Path(post_id): Path<i64>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<CreateCommentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let post = state
    .store
    .get_post(post_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("post not found".to_string()))?;

  if body.content.is_empty() {
    return Err(ApiError::BadRequest("content is required".to_string()));
  }

  let comment = state
    .store
    .create_comment(NewComment {
      content: body.content,
      post_id,
      user_id,
      is_ai_generated: false,
    })
    .await
    .map_err(ApiError::store)?;

  if !post.is_answered {
    state
      .store
      .update_post(post_id, PostUpdate {
        is_answered: Some(true),
        ..Default::default()
      })
      .await
      .map_err(ApiError::store)?;
  }

  Ok((StatusCode::CREATED, Json(comment)))
}

// ─── Votes ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
  pub vote_type: VoteType,
}

/// `POST /api/forum/posts/{id}/votes`
pub async fn vote_post<S>(
  State(state): State<AppState<S>>,
  Path(post_id): Path<i64>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<VoteBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if state
    .store
    .get_post(post_id)
    .await
    .map_err(ApiError::store)?
    .is_none()
  {
    return Err(ApiError::NotFound("post not found".to_string()));
  }
  reconcile(&state, user_id, VoteTarget::post(post_id), body.vote_type).await
}

/// `POST /api/forum/comments/{id}/votes`
pub async fn vote_comment<S>(
  State(state): State<AppState<S>>,
  Path(comment_id): Path<i64>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<VoteBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if state
    .store
    .get_comment(comment_id)
    .await
    .map_err(ApiError::store)?
    .is_none()
  {
    return Err(ApiError::NotFound("comment not found".to_string()));
  }
  reconcile(&state, user_id, VoteTarget::comment(comment_id), body.vote_type).await
}

async fn reconcile<S>(
  state: &AppState<S>,
  user_id: i64,
  target: VoteTarget,
  vote_type: VoteType,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let outcome = state
    .store
    .reconcile_vote(user_id, target, vote_type)
    .await
    .map_err(ApiError::store)?;

  let (status, message) = match outcome {
    VoteOutcome::Recorded => {
      (StatusCode::CREATED, format!("{} added", vote_type.as_str()))
    }
    VoteOutcome::Retracted => {
      (StatusCode::OK, format!("{} removed", vote_type.as_str()))
    }
    VoteOutcome::Switched => {
      (StatusCode::OK, format!("changed to {}", vote_type.as_str()))
    }
  };
  Ok((status, Json(json!({ "message": message }))))
}

// ─── Search ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub q:        Option<String>,
  pub category: Option<String>,
}

/// `GET /api/forum/search?q=&category=`
pub async fn search<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Post>>, ApiError>
where
  S: ForumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let query = params
    .q
    .filter(|q| !q.is_empty())
    .ok_or_else(|| ApiError::BadRequest("search query is required".to_string()))?;

  let posts = match params.category {
    Some(category) => state
      .store
      .search_posts_in_category(&query, &category)
      .await
      .map_err(ApiError::store)?,
    None => state.store.search_posts(&query).await.map_err(ApiError::store)?,
  };
  Ok(Json(posts))
}
