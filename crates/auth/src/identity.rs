use crate::Role;

/// Identity of the caller for the duration of one request.
///
/// Produced by token verification, by the authenticator, or by a session
/// store. There is no public constructor taking raw request data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    subject: String,
    role: Role,
}

impl Identity {
    pub(crate) fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }

    /// Login id of the caller.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn role(&self) -> &Role {
        &self.role
    }
}

/// Outcome of identity resolution for a request.
///
/// "No credential" and "credential that failed verification" both collapse to
/// `Anonymous`; there is no separate anonymous principal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestIdentity {
    Authenticated(Identity),
    #[default]
    Anonymous,
}

impl RequestIdentity {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            RequestIdentity::Authenticated(identity) => Some(identity),
            RequestIdentity::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, RequestIdentity::Authenticated(_))
    }

    pub fn subject(&self) -> Option<&str> {
        self.identity().map(Identity::subject)
    }
}

impl From<Identity> for RequestIdentity {
    fn from(value: Identity) -> Self {
        RequestIdentity::Authenticated(value)
    }
}
