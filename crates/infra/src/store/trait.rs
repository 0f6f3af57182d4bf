use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use board_core::{MemberId, Page, PageRequest, PostId};
use board_members::{Member, NewMember};
use board_posts::{NewPost, Post, PostEdit};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// A unique key (login id) is already taken.
    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("not found")]
    NotFound,

    /// A post was submitted for a login id that has no member row.
    #[error("unknown member: {0}")]
    UnknownMember(String),

    /// Storage failure. The message is for logs only.
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Insert a member. Fails with `Duplicate` if the login id exists.
    async fn insert(&self, member: NewMember) -> Result<Member, RepoError>;

    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, RepoError>;

    async fn find_by_login_id(&self, login_id: &str) -> Result<Option<Member>, RepoError>;
}

/// Post storage. Every read returns the post with its author joined.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: NewPost, now: DateTime<Utc>) -> Result<Post, RepoError>;

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError>;

    /// Newest first (id descending).
    async fn find_page(&self, request: PageRequest) -> Result<Page<Post>, RepoError>;

    /// Replace title and content. The author never changes.
    async fn update_post(
        &self,
        id: PostId,
        edit: &PostEdit,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError>;

    async fn delete(&self, id: PostId) -> Result<(), RepoError>;
}
