use serde::Deserialize;

use board_core::{require_text, DomainError, DomainResult, MemberId};

pub const MAX_LOGIN_ID_LEN: usize = 50;
pub const MAX_NICKNAME_LEN: usize = 50;

/// A registered member as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    /// Unique, case-sensitive login name. Also the token subject.
    pub login_id: String,
    /// PHC string; never the plaintext.
    pub password_hash: String,
    pub nickname: String,
}

/// Raw join form input, before validation. Missing fields arrive empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub login_id: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub nickname: String,
}

impl Registration {
    /// Validate the form. The password is returned separately so the caller
    /// can hash it; the plaintext never ends up in a `NewMember`.
    pub fn validate(self) -> DomainResult<(String, String, String)> {
        let login_id = self.login_id.trim().to_string();
        let nickname = self.nickname.trim().to_string();

        require_text("login_id", &login_id, MAX_LOGIN_ID_LEN)?;
        if login_id.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("login_id must not contain whitespace"));
        }
        if self.password.is_empty() {
            return Err(DomainError::validation("password must not be empty"));
        }
        require_text("nickname", &nickname, MAX_NICKNAME_LEN)?;

        Ok((login_id, self.password, nickname))
    }
}

/// A validated member awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    login_id: String,
    password_hash: String,
    nickname: String,
}

impl NewMember {
    /// `login_id` and `nickname` must come from [`Registration::validate`].
    pub fn new(login_id: String, password_hash: String, nickname: String) -> DomainResult<Self> {
        require_text("login_id", &login_id, MAX_LOGIN_ID_LEN)?;
        require_text("nickname", &nickname, MAX_NICKNAME_LEN)?;
        if password_hash.is_empty() {
            return Err(DomainError::validation("password hash must not be empty"));
        }
        Ok(Self {
            login_id,
            password_hash,
            nickname,
        })
    }

    pub fn login_id(&self) -> &str {
        &self.login_id
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn into_member(self, id: MemberId) -> Member {
        Member {
            id,
            login_id: self.login_id,
            password_hash: self.password_hash,
            nickname: self.nickname,
        }
    }
}
