//! Domain building blocks shared by the board crates.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod page;

pub use error::{require_text, DomainError, DomainResult};
pub use id::{MemberId, PostId};
pub use page::{Page, PageRequest};
