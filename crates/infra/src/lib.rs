//! Infrastructure layer: storage adapters for members and posts.

pub mod store;

pub use store::{InMemoryBoardStore, MemberRepository, PostRepository, RepoError};

#[cfg(feature = "postgres")]
pub use store::PostgresBoardStore;
