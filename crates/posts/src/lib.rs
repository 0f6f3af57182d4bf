//! Posts domain module.
//!
//! Pure rules for creating and editing posts. Who may edit is decided by the
//! ownership guard in `board-auth`, through the [`Owned`](board_auth::Owned)
//! impl on [`Post`].

pub mod post;

pub use post::{Author, NewPost, Post, PostEdit, PostForm};
