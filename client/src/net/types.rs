//! REST DTOs for the blog API.
//!
//! DESIGN
//! ======
//! Field sets mirror the backend's JSON. The user profile is treated as an
//! opaque payload beyond `username`: unknown fields are kept so the value
//! written to persisted storage reads back exactly as it arrived.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Authenticated user as returned by `POST /auth/login`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    /// Remaining profile fields (`id`, `email`, `bio`, `is_admin`, ...).
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl User {
    /// A user with no profile fields beyond the name.
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            profile: Map::new(),
        }
    }

    /// Numeric user id, when the profile carries one.
    pub fn id(&self) -> Option<i64> {
        self.profile.get("id").and_then(Value::as_i64)
    }

    /// Whether the profile marks this user as an administrator.
    pub fn is_admin(&self) -> bool {
        self.profile
            .get("is_admin")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Body of `POST /auth/login` and `POST /auth/register`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Successful login exchange.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

/// Error payload. Upstream handlers disagree on the field name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl ErrorBody {
    /// Parse an error body, tolerating non-JSON responses.
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// The human-readable message, preferring `message` over `msg`.
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().or(self.msg.as_deref())
    }
}

/// A blog post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// One page of `GET /posts`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: u64,
    pub pages: u64,
    pub current_page: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PostPageWire {
    Paged {
        posts: Vec<Post>,
        #[serde(default)]
        total: u64,
        #[serde(default)]
        pages: u64,
        #[serde(default)]
        current_page: u64,
        #[serde(default)]
        has_next: bool,
        #[serde(default)]
        has_prev: bool,
    },
    Bare(Vec<Post>),
}

impl<'de> Deserialize<'de> for PostPage {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match PostPageWire::deserialize(deserializer)? {
            PostPageWire::Paged {
                posts,
                total,
                pages,
                current_page,
                has_next,
                has_prev,
            } => Self {
                posts,
                total,
                pages,
                current_page,
                has_next,
                has_prev,
            },
            PostPageWire::Bare(posts) => {
                let total = u64::try_from(posts.len()).unwrap_or(u64::MAX);
                Self {
                    posts,
                    total,
                    pages: 1,
                    current_page: 1,
                    has_next: false,
                    has_prev: false,
                }
            }
        })
    }
}

/// Query string filters for `GET /posts`. Empty fields are omitted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PostQuery {
    /// Key/value pairs in a stable order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        pairs
    }
}

/// Body of `POST /posts` and `PUT /posts/:id`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PostDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Comma-separated tag list, as the backend stores it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// A comment with its nested replies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub post_id: Option<i64>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub replies: Vec<Comment>,
}

/// Body of `POST /posts/:id/comments`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

/// Totals section of `GET /dashboard/stats`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatTotals {
    #[serde(default)]
    pub total_posts: u64,
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_comments: u64,
    #[serde(default)]
    pub published_posts: u64,
    #[serde(default)]
    pub draft_posts: u64,
}

/// Admin dashboard summary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub stats: StatTotals,
    #[serde(default)]
    pub recent_posts: Vec<Post>,
    #[serde(default)]
    pub recent_comments: Vec<Comment>,
}
