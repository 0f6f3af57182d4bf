//! Application services: the operations behind the HTTP routes.
//!
//! Handlers stay thin; everything that touches repositories, the
//! authenticator or the ownership guard lives here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use board_auth::{
    check_owner, AuthError, Authenticator, OwnershipError, PasswordHasher, RequestIdentity,
    Session, SessionStore, TokenPair,
};
use board_core::{DomainError, Page, PageRequest, PostId};
use board_infra::{MemberRepository, PostRepository, RepoError};
use board_members::{Member, NewMember, Registration};
use board_posts::{NewPost, Post, PostEdit, PostForm};

use crate::app::errors::NotFoundError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("login id already taken: {0}")]
    Duplicate(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    /// The caller has no usable identity for this operation.
    #[error("authentication required")]
    Unauthenticated,

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Ownership(#[from] OwnershipError),

    /// Logged by the error mapper; never shown to clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::InvalidId(msg) => Self::NotFound(NotFoundError::InvalidId(msg)),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Duplicate(login_id) => Self::Duplicate(login_id),
            RepoError::NotFound => Self::NotFound(NotFoundError::Missing),
            // A valid credential whose member row is gone.
            RepoError::UnknownMember(_) => Self::Unauthenticated,
            RepoError::Backend(msg) => Self::Internal(msg),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::Internal(msg) => Self::Internal(msg),
        }
    }
}

pub struct AppServices {
    members: Arc<dyn MemberRepository>,
    posts: Arc<dyn PostRepository>,
    passwords: Arc<dyn PasswordHasher>,
    authenticator: Authenticator,
    /// Present only in session mode.
    sessions: Option<Arc<dyn SessionStore>>,
}

impl AppServices {
    pub fn new(
        members: Arc<dyn MemberRepository>,
        posts: Arc<dyn PostRepository>,
        passwords: Arc<dyn PasswordHasher>,
        authenticator: Authenticator,
        sessions: Option<Arc<dyn SessionStore>>,
    ) -> Self {
        Self {
            members,
            posts,
            passwords,
            authenticator,
            sessions,
        }
    }

    // -------------------------
    // Members
    // -------------------------

    /// Register a member. A taken login id is rejected before any hashing.
    pub async fn join(&self, form: Registration) -> Result<Member, ServiceError> {
        let (login_id, password, nickname) = form.validate()?;

        if self.members.find_by_login_id(&login_id).await?.is_some() {
            tracing::info!(login_id = %login_id, "join rejected: duplicate login id");
            return Err(ServiceError::Duplicate(login_id));
        }

        let passwords = Arc::clone(&self.passwords);
        let hash = tokio::task::spawn_blocking(move || passwords.hash(&password))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let member = self
            .members
            .insert(NewMember::new(login_id, hash, nickname)?)
            .await?;

        tracing::info!(login_id = %member.login_id, member_id = %member.id, "member joined");
        Ok(member)
    }

    pub async fn login_token(
        &self,
        login_id: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, ServiceError> {
        Ok(self.authenticator.login(login_id, password, now).await?)
    }

    /// Authenticate and open a server-side session (session mode only).
    pub async fn login_session(
        &self,
        login_id: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, ServiceError> {
        let sessions = self
            .sessions
            .as_ref()
            .ok_or_else(|| ServiceError::Internal("session store not configured".to_string()))?;

        let identity = self.authenticator.authenticate(login_id, password).await?;
        let session = sessions
            .open(identity, now)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        tracing::info!(subject = session.identity.subject(), "session opened");
        Ok(session)
    }

    pub fn logout_session(&self, session_id: &str) {
        if let Some(sessions) = &self.sessions {
            if sessions.revoke(session_id) {
                tracing::info!("session revoked");
            }
        }
    }

    // -------------------------
    // Posts
    // -------------------------

    pub async fn list_posts(&self, request: PageRequest) -> Result<Page<Post>, ServiceError> {
        Ok(self.posts.find_page(request).await?)
    }

    pub async fn get_post(&self, raw_id: &str) -> Result<Post, ServiceError> {
        let id = parse_post_id(raw_id)?;
        self.load(id).await
    }

    pub async fn create_post(
        &self,
        identity: &RequestIdentity,
        form: PostForm,
        now: DateTime<Utc>,
    ) -> Result<Post, ServiceError> {
        let author = identity.subject().ok_or(ServiceError::Unauthenticated)?;
        let post = self.posts.insert(NewPost::new(form, author)?, now).await?;
        tracing::info!(post_id = %post.id, author, "post created");
        Ok(post)
    }

    /// Load a post for editing. Only its author gets it back.
    pub async fn post_for_edit(
        &self,
        raw_id: &str,
        identity: &RequestIdentity,
    ) -> Result<Post, ServiceError> {
        let post = self.get_post(raw_id).await?;
        check_owner(&post, identity)?;
        Ok(post)
    }

    pub async fn update_post(
        &self,
        raw_id: &str,
        identity: &RequestIdentity,
        form: PostForm,
        now: DateTime<Utc>,
    ) -> Result<Post, ServiceError> {
        let id = parse_post_id(raw_id)?;
        let current = self.load(id).await?;
        check_owner(&current, identity)?;

        let edit = PostEdit::new(form)?;
        let updated = self.posts.update_post(id, &edit, now).await?;
        tracing::info!(post_id = %id, "post updated");
        Ok(updated)
    }

    pub async fn delete_post(
        &self,
        raw_id: &str,
        identity: &RequestIdentity,
    ) -> Result<PostId, ServiceError> {
        let id = parse_post_id(raw_id)?;
        let current = self.load(id).await?;
        check_owner(&current, identity)?;

        self.posts.delete(id).await?;
        tracing::info!(post_id = %id, "post deleted");
        Ok(id)
    }

    async fn load(&self, id: PostId) -> Result<Post, ServiceError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound(NotFoundError::Missing))
    }
}

fn parse_post_id(raw: &str) -> Result<PostId, ServiceError> {
    raw.parse::<PostId>()
        .map_err(|e| NotFoundError::InvalidId(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_auth::{
        Argon2Passwords, BearerTokenResolver, CredentialStore, IdentityResolver,
        InMemorySessionStore, PasswordVerifier, SigningKey, TokenCodec, TokenConfig,
    };
    use board_infra::InMemoryBoardStore;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    struct Fixture {
        services: AppServices,
        codec: Arc<TokenCodec>,
        store: Arc<InMemoryBoardStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryBoardStore::new());
        let passwords = Arc::new(Argon2Passwords::with_params(1024, 1, 1).unwrap());
        let codec = Arc::new(TokenCodec::new(&TokenConfig::new(
            SigningKey::from_bytes(vec![3u8; 32]).unwrap(),
            Duration::hours(24),
            Duration::hours(24),
        )));
        let credentials: Arc<dyn CredentialStore> = store.clone();
        let verifier: Arc<dyn PasswordVerifier> = passwords.clone();
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(Duration::hours(1)));
        let services = AppServices::new(
            store.clone(),
            store.clone(),
            passwords,
            Authenticator::new(credentials, verifier, codec.clone()),
            Some(sessions),
        );
        Fixture {
            services,
            codec,
            store,
        }
    }

    fn registration(login_id: &str, password: &str) -> Registration {
        Registration {
            login_id: login_id.into(),
            password: password.into(),
            nickname: format!("{login_id}-nick"),
        }
    }

    fn form(title: &str) -> PostForm {
        PostForm {
            title: title.into(),
            content: "content".into(),
        }
    }

    async fn identity_of(f: &Fixture, login_id: &str, password: &str) -> RequestIdentity {
        let pair = f.services.login_token(login_id, password, t0()).await.unwrap();
        BearerTokenResolver::new(f.codec.clone()).resolve(Some(&pair.access_token), t0())
    }

    #[tokio::test]
    async fn join_then_login() {
        let f = fixture();
        let member = f.services.join(registration("abcd", "1234")).await.unwrap();
        assert_ne!(member.password_hash, "1234");

        let pair = f.services.login_token("abcd", "1234", t0()).await.unwrap();
        assert_eq!(pair.grant_type, "Bearer");
        assert_eq!(f.codec.verify(&pair.access_token, t0()).unwrap().subject(), "abcd");
        assert_eq!(
            f.services.login_token("abcd", "wrong", t0()).await.unwrap_err(),
            ServiceError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn duplicate_join_keeps_original_member() {
        let f = fixture();
        f.services.join(registration("abcd", "1234")).await.unwrap();
        let err = f.services.join(registration("abcd", "other")).await.unwrap_err();
        assert_eq!(err, ServiceError::Duplicate("abcd".into()));

        assert!(f.services.login_token("abcd", "other", t0()).await.is_err());
        assert!(f.services.login_token("abcd", "1234", t0()).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_registration_is_validation_error() {
        let f = fixture();
        let err = f.services.join(registration("ab cd", "1234")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn only_author_may_update_or_delete() {
        let f = fixture();
        f.services.join(registration("alice", "pw-a")).await.unwrap();
        f.services.join(registration("bob", "pw-b")).await.unwrap();
        let alice = identity_of(&f, "alice", "pw-a").await;
        let bob = identity_of(&f, "bob", "pw-b").await;

        let post = f.services.create_post(&bob, form("bob's"), t0()).await.unwrap();
        let raw = post.id.to_string();

        assert_eq!(
            f.services.delete_post(&raw, &alice).await.unwrap_err(),
            ServiceError::Ownership(OwnershipError::NotOwner)
        );
        assert_eq!(
            f.services.update_post(&raw, &RequestIdentity::Anonymous, form("x"), t0()).await.unwrap_err(),
            ServiceError::Ownership(OwnershipError::NoIdentity)
        );
        assert!(f.services.get_post(&raw).await.is_ok());

        let updated = f.services.update_post(&raw, &bob, form("edited"), t0()).await.unwrap();
        assert_eq!(updated.title, "edited");
        assert_eq!(f.services.delete_post(&raw, &bob).await.unwrap(), post.id);
        assert_eq!(
            f.services.get_post(&raw).await.unwrap_err(),
            ServiceError::NotFound(NotFoundError::Missing)
        );
    }

    #[tokio::test]
    async fn ownership_is_checked_before_edit_validation() {
        let f = fixture();
        f.services.join(registration("alice", "pw-a")).await.unwrap();
        f.services.join(registration("bob", "pw-b")).await.unwrap();
        let alice = identity_of(&f, "alice", "pw-a").await;
        let bob = identity_of(&f, "bob", "pw-b").await;

        let post = f.services.create_post(&bob, form("bob's"), t0()).await.unwrap();
        let err = f
            .services
            .update_post(&post.id.to_string(), &alice, form(" "), t0())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Ownership(OwnershipError::NotOwner));
    }

    #[tokio::test]
    async fn orphaned_post_cannot_be_deleted_by_anyone() {
        let f = fixture();
        f.services.join(registration("bob", "pw-b")).await.unwrap();
        let bob = identity_of(&f, "bob", "pw-b").await;
        let post = f.services.create_post(&bob, form("bob's"), t0()).await.unwrap();

        f.store.remove_member("bob");
        assert_eq!(
            f.services.delete_post(&post.id.to_string(), &bob).await.unwrap_err(),
            ServiceError::Ownership(OwnershipError::OrphanResource)
        );
    }

    #[tokio::test]
    async fn invalid_ids_are_not_found() {
        let f = fixture();
        for raw in ["abc", "0", "-1"] {
            assert!(matches!(
                f.services.get_post(raw).await.unwrap_err(),
                ServiceError::NotFound(NotFoundError::InvalidId(_))
            ));
        }
    }

    #[tokio::test]
    async fn session_login_and_logout() {
        let f = fixture();
        f.services.join(registration("abcd", "1234")).await.unwrap();
        let session = f.services.login_session("abcd", "1234", t0()).await.unwrap();
        assert_eq!(session.identity.subject(), "abcd");

        f.services.logout_session(&session.id);
        assert_eq!(
            f.services.login_session("abcd", "nope", t0()).await.unwrap_err(),
            ServiceError::InvalidCredentials
        );
    }
}
