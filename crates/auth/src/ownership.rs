//! Per-resource ownership guard.
//!
//! Must run after the resource is loaded from storage and before it is
//! mutated or deleted, so the owner compared against is the stored one.

use thiserror::Error;

use crate::RequestIdentity;

/// A resource with a recorded owner (by login id).
pub trait Owned {
    /// `None` for resources whose author no longer exists or was never recorded.
    fn owner_login_id(&self) -> Option<&str>;
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipError {
    #[error("caller is not the owner of this resource")]
    NotOwner,

    #[error("no authenticated identity")]
    NoIdentity,

    /// No one may modify a resource without an owner.
    #[error("resource has no owner")]
    OrphanResource,
}

/// Allow only the recorded owner. Comparison is by login id, exact match.
pub fn check_owner<R: Owned + ?Sized>(
    resource: &R,
    identity: &RequestIdentity,
) -> Result<(), OwnershipError> {
    let owner = resource
        .owner_login_id()
        .filter(|o| !o.is_empty())
        .ok_or(OwnershipError::OrphanResource)?;

    let subject = identity
        .subject()
        .filter(|s| !s.is_empty())
        .ok_or(OwnershipError::NoIdentity)?;

    if subject == owner {
        Ok(())
    } else {
        tracing::warn!(subject, owner, "ownership check denied");
        Err(OwnershipError::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Identity, Role};
    use proptest::prelude::*;

    struct Doc(Option<String>);

    impl Owned for Doc {
        fn owner_login_id(&self) -> Option<&str> {
            self.0.as_deref()
        }
    }

    fn who(subject: &str) -> RequestIdentity {
        RequestIdentity::Authenticated(Identity::new(subject, Role::user()))
    }

    #[test]
    fn owner_may_modify() {
        assert_eq!(check_owner(&Doc(Some("bob".into())), &who("bob")), Ok(()));
    }

    #[test]
    fn other_member_is_not_owner() {
        assert_eq!(
            check_owner(&Doc(Some("bob".into())), &who("alice")),
            Err(OwnershipError::NotOwner)
        );
    }

    #[test]
    fn comparison_is_exact() {
        assert_eq!(
            check_owner(&Doc(Some("Bob".into())), &who("bob")),
            Err(OwnershipError::NotOwner)
        );
    }

    #[test]
    fn anonymous_has_no_identity() {
        assert_eq!(
            check_owner(&Doc(Some("bob".into())), &RequestIdentity::Anonymous),
            Err(OwnershipError::NoIdentity)
        );
    }

    #[test]
    fn orphan_wins_over_everything() {
        assert_eq!(check_owner(&Doc(None), &who("bob")), Err(OwnershipError::OrphanResource));
        assert_eq!(check_owner(&Doc(Some(String::new())), &who("bob")), Err(OwnershipError::OrphanResource));
        assert_eq!(
            check_owner(&Doc(None), &RequestIdentity::Anonymous),
            Err(OwnershipError::OrphanResource)
        );
    }

    proptest! {
        #[test]
        fn ok_iff_subject_equals_owner(owner in "[a-z]{0,6}", subject in "[a-z]{1,6}") {
            let result = check_owner(&Doc(Some(owner.clone())), &who(&subject));
            if owner.is_empty() {
                prop_assert_eq!(result, Err(OwnershipError::OrphanResource));
            } else if owner == subject {
                prop_assert_eq!(result, Ok(()));
            } else {
                prop_assert_eq!(result, Err(OwnershipError::NotOwner));
            }
        }
    }
}
