//! Login credential verification. The only producer of new tokens.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{Identity, PasswordVerifier, Role, TokenCodec, TokenPair};

/// Stored login record as far as authentication is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub login_id: String,
    pub password_hash: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("credential store failure: {0}")]
pub struct CredentialStoreError(pub String);

/// Lookup of member credentials by login id (implemented by the storage layer).
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_credential(
        &self,
        login_id: &str,
    ) -> Result<Option<StoredCredential>, CredentialStoreError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown login id or wrong password. Deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Unexpected failure (store unavailable, token signing failed).
    #[error("authentication unavailable: {0}")]
    Internal(String),
}

pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    passwords: Arc<dyn PasswordVerifier>,
    codec: Arc<TokenCodec>,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        passwords: Arc<dyn PasswordVerifier>,
        codec: Arc<TokenCodec>,
    ) -> Self {
        Self {
            store,
            passwords,
            codec,
        }
    }

    /// Verify a login credential and return the caller's identity.
    ///
    /// An unknown login id still pays for one password check, so the two
    /// failure cases take the same time.
    pub async fn authenticate(&self, login_id: &str, password: &str) -> Result<Identity, AuthError> {
        let stored = self.store.find_credential(login_id).await.map_err(|e| {
            tracing::error!(error = %e, "credential lookup failed");
            AuthError::Internal(e.to_string())
        })?;

        let stored_hash = stored.as_ref().map(|s| s.password_hash.clone());
        let matched = self.check_password(password, stored_hash).await?;

        match stored {
            Some(stored) if matched => Ok(Identity::new(stored.login_id, Role::user())),
            _ => {
                tracing::warn!(login_id, "login rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Password hashing is CPU-bound, so it runs on the blocking pool.
    async fn check_password(
        &self,
        password: &str,
        stored_hash: Option<String>,
    ) -> Result<bool, AuthError> {
        let passwords = Arc::clone(&self.passwords);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => passwords.verify(&password, &hash),
            None => {
                passwords.verify_decoy(&password);
                false
            }
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password check task failed");
            AuthError::Internal(e.to_string())
        })
    }

    /// Authenticate and issue a token pair.
    pub async fn login(
        &self,
        login_id: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AuthError> {
        let identity = self.authenticate(login_id, password).await?;
        let pair = self.codec.issue(&identity, now).map_err(|e| {
            tracing::error!(error = %e, "token issuance failed");
            AuthError::Internal(e.to_string())
        })?;
        tracing::info!(subject = identity.subject(), "login succeeded");
        Ok(pair)
    }
}
