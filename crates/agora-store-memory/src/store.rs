//! [`MemoryStore`] — the in-memory implementation of [`ForumStore`].

use std::{
  collections::BTreeMap,
  sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;

use agora_core::{
  Error, SYSTEM_USER_ID,
  chat::{AiChat, AiChatMessage, ChatId, ChatMessageId, MessagePreview, NewAiChat, NewAiChatMessage},
  comment::{Comment, CommentId, NewComment},
  document::{Document, DocumentId, DocumentStatus, DocumentUpdate, NewDocument},
  post::{NewPost, Post, PostId, PostQuery, PostSort, PostUpdate},
  store::ForumStore,
  user::{NewUser, User, UserId, UserSummary},
  vote::{Vote, VoteId, VoteOutcome, VoteTarget, VoteType},
};

// ─── State ───────────────────────────────────────────────────────────────────

/// Everything the store owns. Guarded by one mutex: the id counters and
/// the at-most-one-vote-per-target invariant are only safe when writers
/// are serialised.
struct State {
  users:     BTreeMap<UserId, User>,
  posts:     BTreeMap<PostId, Post>,
  comments:  BTreeMap<CommentId, Comment>,
  votes:     BTreeMap<VoteId, Vote>,
  chats:     BTreeMap<ChatId, AiChat>,
  messages:  BTreeMap<ChatMessageId, AiChatMessage>,
  documents: BTreeMap<DocumentId, Document>,

  // Per-entity counters; never reuse a retired id within the process.
  next_user_id:     UserId,
  next_post_id:     PostId,
  next_comment_id:  CommentId,
  next_vote_id:     VoteId,
  next_chat_id:     ChatId,
  next_message_id:  ChatMessageId,
  next_document_id: DocumentId,
}

impl State {
  fn summary_for(&self, user_id: UserId) -> Option<UserSummary> {
    self.users.get(&user_id).map(User::summary)
  }

  fn comment_count(&self, post_id: PostId) -> u32 {
    self.comments.values().filter(|c| c.post_id == post_id).count() as u32
  }

  /// The read shape of a post: author summary back-filled when missing,
  /// comment count recomputed. O(total comments) per call — accepted at
  /// this scale.
  fn read_post(&self, post: &Post) -> Post {
    let mut post = post.clone();
    if post.user.is_none() {
      post.user = self.summary_for(post.user_id);
    }
    post.comment_count = self.comment_count(post.id);
    post
  }

  fn read_comment(&self, comment: &Comment) -> Comment {
    let mut comment = comment.clone();
    if comment.user.is_none() {
      comment.user = self.summary_for(comment.user_id);
    }
    comment
  }

  fn read_document(&self, document: &Document) -> Document {
    let mut document = document.clone();
    if document.uploaded_by.is_none() {
      document.uploaded_by =
        self.users.get(&document.uploaded_by_id).map(User::uploader_summary);
    }
    document
  }

  /// The read shape of a chat: preview of its most recent message.
  fn read_chat(&self, chat: &AiChat) -> AiChat {
    let mut chat = chat.clone();
    chat.last_message = self
      .messages
      .values()
      .filter(|m| m.chat_id == chat.id)
      .max_by_key(|m| (m.created_at, m.id))
      .map(MessagePreview::of);
    chat
  }

  fn tally_votes(&self, target: VoteTarget) -> (u32, u32) {
    let mut upvotes = 0;
    let mut downvotes = 0;
    for vote in self.votes.values().filter(|v| v.target == target) {
      match vote.vote_type {
        VoteType::Upvote => upvotes += 1,
        VoteType::Downvote => downvotes += 1,
      }
    }
    (upvotes, downvotes)
  }

  /// Recount a comment's tallies from the live vote set and overwrite its
  /// counters. A no-op for an unknown id.
  fn recount_comment(&mut self, id: CommentId) {
    let (upvotes, downvotes) = self.tally_votes(VoteTarget::comment(id));
    if let Some(comment) = self.comments.get_mut(&id) {
      comment.upvotes = upvotes;
      comment.downvotes = downvotes;
    }
  }

  fn recount_post(&mut self, id: PostId) {
    let (upvotes, downvotes) = self.tally_votes(VoteTarget::post(id));
    if let Some(post) = self.posts.get_mut(&id) {
      post.upvotes = upvotes;
      post.downvotes = downvotes;
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Agora store holding all entities in process memory.
///
/// Construct one per process (or per test) and share it behind an `Arc`;
/// there is no hidden global instance.
pub struct MemoryStore {
  state: Mutex<State>,
}

impl MemoryStore {
  /// Create an empty store and seed the reserved assistant account
  /// (id 1). Regular accounts start at id 2.
  pub fn new() -> Self {
    let mut users = BTreeMap::new();
    users.insert(SYSTEM_USER_ID, User {
      id:         SYSTEM_USER_ID,
      username:   "ai-assistant".to_string(),
      email:      "ai@agora.local".to_string(),
      name:       "AI Assistant".to_string(),
      // Not a valid PHC string, so this account can never log in.
      password_hash: String::new(),
      avatar:     None,
      department: None,
      job_title:  Some("Assistant".to_string()),
      created_at: Utc::now(),
    });

    Self {
      state: Mutex::new(State {
        users,
        posts:     BTreeMap::new(),
        comments:  BTreeMap::new(),
        votes:     BTreeMap::new(),
        chats:     BTreeMap::new(),
        messages:  BTreeMap::new(),
        documents: BTreeMap::new(),
        next_user_id:     SYSTEM_USER_ID + 1,
        next_post_id:     1,
        next_comment_id:  1,
        next_vote_id:     1,
        next_chat_id:     1,
        next_message_id:  1,
        next_document_id: 1,
      }),
    }
  }

  /// No method holds the guard across an await point, so a poisoned lock
  /// only means a panic mid-mutation elsewhere; recover the inner state.
  fn locked(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl Default for MemoryStore {
  fn default() -> Self {
    Self::new()
  }
}

impl ForumStore for MemoryStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User, Error> {
    let mut state = self.locked();
    let id = state.next_user_id;
    state.next_user_id += 1;

    let user = User {
      id,
      username:   input.username,
      email:      input.email,
      name:       input.name,
      password_hash: input.password_hash,
      avatar:     input.avatar,
      department: input.department,
      job_title:  input.job_title,
      created_at: Utc::now(),
    };
    state.users.insert(id, user.clone());
    Ok(user)
  }

  async fn get_user(&self, id: UserId) -> Result<Option<User>, Error> {
    Ok(self.locked().users.get(&id).cloned())
  }

  async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
    let state = self.locked();
    Ok(state.users.values().find(|u| u.username == username).cloned())
  }

  async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
    let state = self.locked();
    Ok(state.users.values().find(|u| u.email == email).cloned())
  }

  // ── Posts ─────────────────────────────────────────────────────────────

  async fn create_post(&self, input: NewPost) -> Result<Post, Error> {
    let mut state = self.locked();
    let id = state.next_post_id;
    state.next_post_id += 1;

    let post = Post {
      id,
      title:      input.title,
      content:    input.content,
      user_id:    input.user_id,
      category:   input.category,
      tags:       input.tags,
      created_at: Utc::now(),
      updated_at: None,
      views:      0,
      is_answered:   false,
      has_ai_answer: false,
      upvotes:    0,
      downvotes:  0,
      // Author summary captured at creation time.
      user:       state.summary_for(input.user_id),
      comment_count: 0,
    };
    state.posts.insert(id, post.clone());
    Ok(post)
  }

  async fn get_post(&self, id: PostId) -> Result<Option<Post>, Error> {
    let state = self.locked();
    Ok(state.posts.get(&id).map(|p| state.read_post(p)))
  }

  async fn update_post(
    &self,
    id: PostId,
    update: PostUpdate,
  ) -> Result<Option<Post>, Error> {
    let mut state = self.locked();
    let Some(post) = state.posts.get_mut(&id) else {
      return Ok(None);
    };

    if let Some(title) = update.title {
      post.title = title;
    }
    if let Some(content) = update.content {
      post.content = content;
    }
    if let Some(views) = update.views {
      post.views = views;
    }
    if let Some(is_answered) = update.is_answered {
      post.is_answered = is_answered;
    }
    if let Some(has_ai_answer) = update.has_ai_answer {
      post.has_ai_answer = has_ai_answer;
    }
    post.updated_at = Some(Utc::now());

    let post = post.clone();
    Ok(Some(state.read_post(&post)))
  }

  async fn posts_by_category(
    &self,
    category: &str,
    query: PostQuery,
  ) -> Result<Vec<Post>, Error> {
    let state = self.locked();
    let mut posts: Vec<&Post> =
      state.posts.values().filter(|p| p.category == category).collect();

    // Vec::sort_by is stable, so ties keep their id (insertion) order.
    match query.sort {
      PostSort::Recent => {
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
      }
      PostSort::Popular => {
        posts.sort_by(|a, b| b.views.cmp(&a.views));
      }
      PostSort::Unanswered => {
        // Filter-then-sort, not sort-then-filter.
        posts.retain(|p| !p.is_answered);
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
      }
    }

    let start = query.page.saturating_sub(1) as usize * query.limit as usize;
    Ok(
      posts
        .into_iter()
        .skip(start)
        .take(query.limit as usize)
        .map(|p| state.read_post(p))
        .collect(),
    )
  }

  async fn count_posts_by_category(&self, category: &str) -> Result<u64, Error> {
    let state = self.locked();
    Ok(state.posts.values().filter(|p| p.category == category).count() as u64)
  }

  async fn search_posts(&self, query: &str) -> Result<Vec<Post>, Error> {
    let state = self.locked();
    let needle = query.to_lowercase();
    Ok(
      state
        .posts
        .values()
        .filter(|p| {
          p.title.to_lowercase().contains(&needle)
            || p.content.to_lowercase().contains(&needle)
        })
        .map(|p| state.read_post(p))
        .collect(),
    )
  }

  async fn search_posts_in_category(
    &self,
    query: &str,
    category: &str,
  ) -> Result<Vec<Post>, Error> {
    let state = self.locked();
    let needle = query.to_lowercase();
    Ok(
      state
        .posts
        .values()
        .filter(|p| p.category == category)
        .filter(|p| {
          p.title.to_lowercase().contains(&needle)
            || p.content.to_lowercase().contains(&needle)
        })
        .map(|p| state.read_post(p))
        .collect(),
    )
  }

  // ── Comments ──────────────────────────────────────────────────────────

  async fn create_comment(&self, input: NewComment) -> Result<Comment, Error> {
    let mut state = self.locked();
    let id = state.next_comment_id;
    state.next_comment_id += 1;

    let comment = Comment {
      id,
      content:    input.content,
      post_id:    input.post_id,
      user_id:    input.user_id,
      created_at: Utc::now(),
      updated_at: None,
      upvotes:    0,
      downvotes:  0,
      is_ai_generated: input.is_ai_generated,
      user:       state.summary_for(input.user_id),
    };
    state.comments.insert(id, comment.clone());
    Ok(comment)
  }

  async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, Error> {
    let state = self.locked();
    Ok(state.comments.get(&id).map(|c| state.read_comment(c)))
  }

  async fn comments_by_post(&self, post_id: PostId) -> Result<Vec<Comment>, Error> {
    let state = self.locked();
    let mut comments: Vec<&Comment> =
      state.comments.values().filter(|c| c.post_id == post_id).collect();
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(comments.into_iter().map(|c| state.read_comment(c)).collect())
  }

  async fn refresh_comment_votes(&self, id: CommentId) -> Result<(), Error> {
    self.locked().recount_comment(id);
    Ok(())
  }

  async fn refresh_post_votes(&self, id: PostId) -> Result<(), Error> {
    self.locked().recount_post(id);
    Ok(())
  }

  // ── Votes ─────────────────────────────────────────────────────────────

  async fn reconcile_vote(
    &self,
    user_id: UserId,
    target: VoteTarget,
    vote_type: VoteType,
  ) -> Result<VoteOutcome, Error> {
    let mut state = self.locked();

    let target_exists = match target {
      VoteTarget::Post { post_id } => state.posts.contains_key(&post_id),
      VoteTarget::Comment { comment_id } => state.comments.contains_key(&comment_id),
    };
    if !target_exists {
      return Err(Error::MissingVoteTarget(target));
    }

    let existing = state
      .votes
      .values()
      .find(|v| v.user_id == user_id && v.target == target)
      .map(|v| (v.id, v.vote_type));

    let outcome = match existing {
      None => {
        let id = state.next_vote_id;
        state.next_vote_id += 1;
        state.votes.insert(id, Vote {
          id,
          user_id,
          target,
          vote_type,
          created_at: Utc::now(),
          updated_at: None,
        });
        VoteOutcome::Recorded
      }
      Some((id, existing_type)) if existing_type == vote_type => {
        state.votes.remove(&id);
        VoteOutcome::Retracted
      }
      Some((id, _)) => {
        if let Some(vote) = state.votes.get_mut(&id) {
          vote.vote_type = vote_type;
          vote.updated_at = Some(Utc::now());
        }
        VoteOutcome::Switched
      }
    };

    // Re-materialise the target's tallies after every outcome.
    match target {
      VoteTarget::Post { post_id } => state.recount_post(post_id),
      VoteTarget::Comment { comment_id } => state.recount_comment(comment_id),
    }

    Ok(outcome)
  }

  async fn vote_for(
    &self,
    user_id: UserId,
    target: VoteTarget,
  ) -> Result<Option<Vote>, Error> {
    let state = self.locked();
    Ok(
      state
        .votes
        .values()
        .find(|v| v.user_id == user_id && v.target == target)
        .cloned(),
    )
  }

  // ── AI chats ──────────────────────────────────────────────────────────

  async fn create_ai_chat(&self, input: NewAiChat) -> Result<AiChat, Error> {
    let mut state = self.locked();
    let id = state.next_chat_id;
    state.next_chat_id += 1;

    let chat = AiChat {
      id,
      user_id:    input.user_id,
      category:   input.category,
      created_at: Utc::now(),
      last_message: None,
    };
    state.chats.insert(id, chat.clone());
    Ok(chat)
  }

  async fn get_ai_chat(&self, id: ChatId) -> Result<Option<AiChat>, Error> {
    let state = self.locked();
    Ok(state.chats.get(&id).map(|c| state.read_chat(c)))
  }

  async fn ai_chats_by_user(&self, user_id: UserId) -> Result<Vec<AiChat>, Error> {
    let state = self.locked();
    let mut chats: Vec<&AiChat> =
      state.chats.values().filter(|c| c.user_id == user_id).collect();
    chats.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(chats.into_iter().map(|c| state.read_chat(c)).collect())
  }

  async fn create_ai_chat_message(
    &self,
    input: NewAiChatMessage,
  ) -> Result<AiChatMessage, Error> {
    let mut state = self.locked();
    let id = state.next_message_id;
    state.next_message_id += 1;

    let message = AiChatMessage {
      id,
      chat_id:    input.chat_id,
      content:    input.content,
      is_user_message: input.is_user_message,
      created_at: Utc::now(),
    };
    state.messages.insert(id, message.clone());
    Ok(message)
  }

  async fn ai_chat_messages(&self, chat_id: ChatId) -> Result<Vec<AiChatMessage>, Error> {
    let state = self.locked();
    let mut messages: Vec<AiChatMessage> =
      state.messages.values().filter(|m| m.chat_id == chat_id).cloned().collect();
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(messages)
  }

  // ── Documents ─────────────────────────────────────────────────────────

  async fn create_document(&self, input: NewDocument) -> Result<Document, Error> {
    let mut state = self.locked();
    let id = state.next_document_id;
    state.next_document_id += 1;

    let document = Document {
      id,
      name:        input.name,
      description: input.description,
      file_type:   input.file_type,
      file_size:   input.file_size,
      category:    input.category,
      document_type: input.document_type,
      file_path:   input.file_path,
      uploaded_by_id: input.uploaded_by_id,
      created_at:  Utc::now(),
      updated_at:  None,
      status:      DocumentStatus::Pending,
      embedding_id: None,
      uploaded_by: state
        .users
        .get(&input.uploaded_by_id)
        .map(User::uploader_summary),
    };
    state.documents.insert(id, document.clone());
    Ok(document)
  }

  async fn get_document(&self, id: DocumentId) -> Result<Option<Document>, Error> {
    let state = self.locked();
    Ok(state.documents.get(&id).map(|d| state.read_document(d)))
  }

  async fn update_document(
    &self,
    id: DocumentId,
    update: DocumentUpdate,
  ) -> Result<Option<Document>, Error> {
    let mut state = self.locked();
    let Some(document) = state.documents.get_mut(&id) else {
      return Ok(None);
    };

    if let Some(name) = update.name {
      document.name = name;
    }
    if let Some(description) = update.description {
      document.description = Some(description);
    }
    if let Some(category) = update.category {
      document.category = category;
    }
    if let Some(document_type) = update.document_type {
      document.document_type = document_type;
    }
    if let Some(status) = update.status {
      document.status = status;
    }
    if let Some(embedding_id) = update.embedding_id {
      document.embedding_id = Some(embedding_id);
    }
    document.updated_at = Some(Utc::now());

    let document = document.clone();
    Ok(Some(state.read_document(&document)))
  }

  async fn documents_by_category(&self, category: &str) -> Result<Vec<Document>, Error> {
    let state = self.locked();
    let mut documents: Vec<&Document> =
      state.documents.values().filter(|d| d.category == category).collect();
    documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(documents.into_iter().map(|d| state.read_document(d)).collect())
  }

  async fn all_documents(&self) -> Result<Vec<Document>, Error> {
    let state = self.locked();
    let mut documents: Vec<&Document> = state.documents.values().collect();
    documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(documents.into_iter().map(|d| state.read_document(d)).collect())
  }

  async fn delete_document(&self, id: DocumentId) -> Result<bool, Error> {
    Ok(self.locked().documents.remove(&id).is_some())
  }
}
