//! Authentication and authorization boundary for the board.
//!
//! This crate is intentionally decoupled from HTTP and storage: the credential
//! store and session store are traits, and every time-dependent operation takes
//! `now` explicitly.
//!
//! Request flow, leaves first:
//! - [`TokenCodec`] signs and verifies access/refresh tokens.
//! - [`Authenticator`] checks a login credential and is the only token producer.
//! - [`IdentityResolver`] turns a request credential into a [`RequestIdentity`].
//! - [`AccessPolicy`] decides per path whether an identity is required.
//! - [`check_owner`] guards mutation of owned resources.

pub mod authenticator;
pub mod claims;
pub mod identity;
pub mod ownership;
pub mod password;
pub mod policy;
pub mod resolver;
pub mod roles;
pub mod session;
pub mod token;

pub use authenticator::{
    AuthError, Authenticator, CredentialStore, CredentialStoreError, StoredCredential,
};
pub use claims::{Claims, TokenError};
pub use identity::{Identity, RequestIdentity};
pub use ownership::{check_owner, Owned, OwnershipError};
pub use password::{Argon2Passwords, PasswordError, PasswordHasher, PasswordVerifier};
pub use policy::{AccessPolicy, AccessRule, GateDecision, PathPattern, Requirement};
pub use resolver::{BearerTokenResolver, CookieSessionResolver, IdentityResolver};
pub use roles::Role;
pub use session::{InMemorySessionStore, Session, SessionError, SessionStore};
pub use token::{KeyError, SigningKey, TokenCodec, TokenConfig, TokenIssueError, TokenPair};
