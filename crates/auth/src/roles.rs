use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role carried in the access token's `auth` claim.
///
/// Roles are opaque strings at this layer. Every registered member currently
/// authenticates as [`Role::USER`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const USER: &'static str = "USER";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn user() -> Self {
        Self(Cow::Borrowed(Self::USER))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
