//! Members domain module.
//!
//! Registration rules only (no IO, no hashing, no storage). Password hashing
//! happens before a `NewMember` reaches the repository.

pub mod member;

pub use member::{Member, NewMember, Registration};
