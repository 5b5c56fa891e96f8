//! Posts and feed rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Comment;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Filled in by callers that want a post with its thread; never persisted.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

impl Post {
    pub fn new(
        user_id: i64,
        title: impl Into<String>,
        content: impl Into<String>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            content: content.into(),
            tags,
            ..Self::default()
        }
    }
}

/// Feed entry: a post joined with its author's username and comment count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PostWithMetadata {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub post: Post,
    pub username: String,
    pub comments_count: i64,
}
