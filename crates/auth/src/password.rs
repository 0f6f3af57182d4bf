//! One-way password hashing (Argon2id, PHC strings).

use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::{PasswordHash, SaltString};
use thiserror::Error;

/// Fixed salt for decoy work. Its output is discarded.
const DECOY_SALT: [u8; 16] = *b"board-decoy-salt";

/// Argon2's default output length, matching what `hash` stores.
const OUTPUT_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("failed to gather salt entropy: {0}")]
    Entropy(String),

    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// Compare a plaintext password with a stored hash.
pub trait PasswordVerifier: Send + Sync {
    fn verify(&self, plain: &str, hash: &str) -> bool;

    /// Do the work of a failed `verify` when there is no stored hash to check,
    /// so an unknown login id costs as much as a wrong password.
    fn verify_decoy(&self, plain: &str);
}

/// Produce a storable hash for a plaintext password.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, PasswordError>;
}

/// Argon2id hasher/verifier.
#[derive(Clone, Default)]
pub struct Argon2Passwords {
    argon2: Argon2<'static>,
}

impl core::fmt::Debug for Argon2Passwords {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Argon2Passwords")
    }
}

impl Argon2Passwords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom cost parameters (memory KiB, iterations, parallelism).
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl PasswordHasher for Argon2Passwords {
    fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        use argon2::PasswordHasher as _;

        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| PasswordError::Entropy(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;

        let phc = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?
            .to_string();
        Ok(phc)
    }
}

impl PasswordVerifier for Argon2Passwords {
    /// An unparseable stored hash never verifies.
    fn verify(&self, plain: &str, hash: &str) -> bool {
        use argon2::PasswordVerifier as _;

        match PasswordHash::new(hash) {
            Ok(parsed) => self.argon2.verify_password(plain.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }

    fn verify_decoy(&self, plain: &str) {
        let mut out = [0u8; OUTPUT_LEN];
        let _ = self
            .argon2
            .hash_password_into(plain.as_bytes(), &DECOY_SALT, &mut out);
    }
}
