//! Member and post repositories.
//!
//! - `trait.rs`: repository contracts and the storage error type
//! - `in_memory.rs`: single-process store for tests and local runs
//! - `postgres.rs`: persistent store (feature `postgres`)

mod r#trait;
mod in_memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use in_memory::InMemoryBoardStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresBoardStore;
pub use r#trait::{MemberRepository, PostRepository, RepoError};
