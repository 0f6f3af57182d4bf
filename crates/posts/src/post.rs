use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use board_auth::Owned;
use board_core::{require_text, DomainResult, PostId};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_CONTENT_LEN: usize = 10_000;

/// Author as joined from the members table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub login_id: String,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    /// `None` when the author row is gone. Such posts are read-only.
    pub author: Option<Author>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Post {
    /// Nickname for display, with a placeholder for orphaned posts.
    pub fn author_nickname(&self) -> &str {
        self.author
            .as_ref()
            .map(|a| a.nickname.as_str())
            .unwrap_or("unknown user")
    }
}

impl Owned for Post {
    fn owner_login_id(&self) -> Option<&str> {
        self.author.as_ref().map(|a| a.login_id.as_str())
    }
}

/// Title and content as submitted by a form. Missing fields arrive empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

fn validate(title: &str, content: &str) -> DomainResult<()> {
    require_text("title", title, MAX_TITLE_LEN)?;
    require_text("content", content, MAX_CONTENT_LEN)
}

/// A validated post awaiting insertion. The author is fixed here and never
/// changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    title: String,
    content: String,
    author_login_id: String,
}

impl NewPost {
    pub fn new(form: PostForm, author_login_id: impl Into<String>) -> DomainResult<Self> {
        let title = form.title.trim().to_string();
        validate(&title, &form.content)?;
        Ok(Self {
            title,
            content: form.content,
            author_login_id: author_login_id.into(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn author_login_id(&self) -> &str {
        &self.author_login_id
    }
}

/// Validated replacement for title and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEdit {
    title: String,
    content: String,
}

impl PostEdit {
    pub fn new(form: PostForm) -> DomainResult<Self> {
        let title = form.title.trim().to_string();
        validate(&title, &form.content)?;
        Ok(Self {
            title,
            content: form.content,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
