use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Identity, Role};

/// Verified claims of an access token.
///
/// Only [`TokenCodec::verify`](crate::TokenCodec::verify) produces these, and
/// they cannot be assembled or turned into an identity outside this crate:
///
/// ```compile_fail
/// use board_auth::{Claims, Role};
/// let forged = Claims { subject: "bob".into(), role: Role::user(), issued_at: chrono::Utc::now(), expires_at: chrono::Utc::now() };
/// ```
///
/// ```compile_fail
/// fn forge(claims: board_auth::Claims) -> board_auth::Identity {
///     claims.into_identity()
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    subject: String,
    role: Role,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Claims {
    /// Login id of the token holder.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub(crate) fn into_identity(self) -> Identity {
        Identity::new(self.subject, self.role)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Unparseable, wrong algorithm, or signature mismatch.
    #[error("malformed or forged token")]
    Malformed,

    /// Signature is valid but `exp` has passed. The subject is kept for diagnostics.
    #[error("token expired at {expired_at}")]
    Expired {
        subject: Option<String>,
        expired_at: DateTime<Utc>,
    },

    /// Signature is valid but claims required of an access token are missing
    /// (e.g. a refresh token presented as an access credential).
    #[error("token variant not accepted here")]
    UnsupportedVariant,
}

/// Claims as they appear on the wire.
///
/// Access tokens carry `sub`, `auth`, `iat` and `exp`. Refresh tokens carry `exp` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct WireClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    pub exp: i64,
}

impl WireClaims {
    /// Check the claim set against `now` and the access-token shape.
    ///
    /// Expiry is checked before shape so an expired refresh token reports
    /// `Expired`, matching how an expired access token reports.
    pub(crate) fn into_verified(self, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let expires_at = timestamp(self.exp)?;
        if now > expires_at {
            return Err(TokenError::Expired {
                subject: self.sub,
                expired_at: expires_at,
            });
        }

        let subject = self
            .sub
            .filter(|s| !s.is_empty())
            .ok_or(TokenError::UnsupportedVariant)?;
        let role = self
            .auth
            .filter(|r| !r.is_empty())
            .ok_or(TokenError::UnsupportedVariant)?;
        let issued_at = timestamp(self.iat.ok_or(TokenError::UnsupportedVariant)?)?;

        if expires_at < issued_at {
            return Err(TokenError::Malformed);
        }

        Ok(Claims {
            subject,
            role: Role::new(role),
            issued_at,
            expires_at,
        })
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, TokenError> {
    DateTime::from_timestamp(secs, 0).ok_or(TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn access(iat: i64, exp: i64) -> WireClaims {
        WireClaims {
            sub: Some("alice".into()),
            auth: Some("USER".into()),
            iat: Some(iat),
            exp,
        }
    }

    #[test]
    fn valid_up_to_and_including_exp() {
        let claims = access(100, 200).into_verified(at(200)).unwrap();
        assert_eq!(claims.subject(), "alice");
        assert_eq!(claims.role().as_str(), "USER");
        assert_eq!(claims.expires_at(), at(200));
    }

    #[test]
    fn expired_keeps_subject() {
        let err = access(100, 200).into_verified(at(201)).unwrap_err();
        assert_eq!(
            err,
            TokenError::Expired {
                subject: Some("alice".into()),
                expired_at: at(200)
            }
        );
    }

    #[test]
    fn refresh_shape_is_unsupported_as_access() {
        let refresh = WireClaims {
            sub: None,
            auth: None,
            iat: None,
            exp: 200,
        };
        assert_eq!(
            refresh.into_verified(at(150)),
            Err(TokenError::UnsupportedVariant)
        );
    }

    #[test]
    fn empty_role_is_unsupported() {
        let mut claims = access(100, 200);
        claims.auth = Some(String::new());
        assert_eq!(claims.into_verified(at(150)), Err(TokenError::UnsupportedVariant));
    }

    #[test]
    fn inverted_window_is_malformed() {
        assert_eq!(access(300, 200).into_verified(at(150)), Err(TokenError::Malformed));
    }

    #[test]
    fn out_of_range_exp_is_malformed() {
        assert_eq!(access(0, i64::MAX).into_verified(at(150)), Err(TokenError::Malformed));
    }
}
