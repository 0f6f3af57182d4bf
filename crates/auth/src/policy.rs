//! Route-level access policy.
//!
//! Rules are evaluated in declaration order and the first matching pattern
//! wins. A path no rule matches requires authentication.

use crate::RequestIdentity;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Reject,
}

/// Path pattern: exact (`/posts`) or trailing-wildcard prefix (`/css/*`, `/posts/**`).
///
/// A wildcard directly after a slash also matches the bare parent, so
/// `/posts/**` matches `/posts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    kind: PatternKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternKind {
    Exact(String),
    Prefix { prefix: String, parent: Option<String> },
}

impl PathPattern {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let stripped = raw.trim_end_matches('*');

        let kind = if stripped.len() == raw.len() {
            PatternKind::Exact(normalize(&raw).to_string())
        } else {
            let parent = stripped.strip_suffix('/').map(str::to_string);
            PatternKind::Prefix {
                prefix: stripped.to_string(),
                parent,
            }
        };

        Self { raw, kind }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        let path = normalize(path);
        match &self.kind {
            PatternKind::Exact(p) => path == p,
            PatternKind::Prefix { prefix, parent } => {
                path.starts_with(prefix.as_str()) || parent.as_deref() == Some(path)
            }
        }
    }
}

/// Ignore trailing slashes so `/posts/add/` cannot dodge a `/posts/add` rule.
fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub pattern: PathPattern,
    pub requirement: Requirement,
}

impl AccessRule {
    pub fn public(pattern: impl Into<String>) -> Self {
        Self {
            pattern: PathPattern::new(pattern),
            requirement: Requirement::Public,
        }
    }

    pub fn authenticated(pattern: impl Into<String>) -> Self {
        Self {
            pattern: PathPattern::new(pattern),
            requirement: Requirement::Authenticated,
        }
    }
}

/// Static, read-only rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    /// Rules for the discussion board.
    ///
    /// Post mutation routes other than `/posts/add` pass the gate and are
    /// protected by the ownership guard in their handlers.
    pub fn board_defaults() -> Self {
        Self::new(vec![
            AccessRule::public("/"),
            AccessRule::public("/health"),
            AccessRule::public("/members/login"),
            AccessRule::public("/members/join"),
            AccessRule::public("/login"),
            AccessRule::public("/logout"),
            AccessRule::public("/auth/token"),
            AccessRule::public("/css/**"),
            AccessRule::public("/images/**"),
            AccessRule::public("/js/**"),
            AccessRule::public("/favicon.ico"),
            AccessRule::authenticated("/posts/add"),
            AccessRule::public("/posts/**"),
        ])
    }

    /// First rule whose pattern matches `path`, if any.
    pub fn matching_rule(&self, path: &str) -> Option<&AccessRule> {
        self.rules.iter().find(|rule| rule.pattern.matches(path))
    }

    pub fn requirement_for(&self, path: &str) -> Requirement {
        self.matching_rule(path)
            .map(|rule| rule.requirement)
            .unwrap_or(Requirement::Authenticated)
    }

    pub fn decide(&self, path: &str, identity: &RequestIdentity) -> GateDecision {
        match self.requirement_for(path) {
            Requirement::Public => GateDecision::Proceed,
            Requirement::Authenticated if identity.is_authenticated() => GateDecision::Proceed,
            Requirement::Authenticated => GateDecision::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Identity, Role};

    fn alice() -> RequestIdentity {
        RequestIdentity::Authenticated(Identity::new("alice", Role::user()))
    }

    #[test]
    fn exact_pattern() {
        let p = PathPattern::new("/posts/add");
        assert!(p.matches("/posts/add"));
        assert!(p.matches("/posts/add/"));
        assert!(!p.matches("/posts/added"));
        assert!(!p.matches("/posts"));
    }

    #[test]
    fn wildcard_pattern_matches_parent_and_children() {
        let p = PathPattern::new("/posts/**");
        assert!(p.matches("/posts"));
        assert!(p.matches("/posts/3"));
        assert!(p.matches("/posts/3/delete"));
        assert!(!p.matches("/postsx"));
        assert!(!p.matches("/members/me"));
    }

    #[test]
    fn bare_prefix_pattern() {
        let p = PathPattern::new("/static*");
        assert!(p.matches("/static"));
        assert!(p.matches("/static-assets/a.css"));
        assert!(!p.matches("/stat"));
    }

    #[test]
    fn root_is_exact() {
        let p = PathPattern::new("/");
        assert!(p.matches("/"));
        assert!(!p.matches("/posts"));
    }

    #[test]
    fn first_match_wins() {
        let policy = AccessPolicy::board_defaults();
        assert_eq!(policy.requirement_for("/posts/add"), Requirement::Authenticated);
        assert_eq!(policy.requirement_for("/posts"), Requirement::Public);
        assert_eq!(policy.requirement_for("/posts/3"), Requirement::Public);

        let reversed = AccessPolicy::new(vec![
            AccessRule::public("/posts/**"),
            AccessRule::authenticated("/posts/add"),
        ]);
        assert_eq!(reversed.requirement_for("/posts/add"), Requirement::Public);
    }

    #[test]
    fn matching_rule_reports_pattern() {
        let policy = AccessPolicy::board_defaults();
        let rule = policy.matching_rule("/posts/3/edit").unwrap();
        assert_eq!(rule.pattern.as_str(), "/posts/**");
        assert_eq!(rule.requirement, Requirement::Public);
        assert!(policy.matching_rule("/members/me").is_none());
    }

    #[test]
    fn unmatched_paths_fail_closed() {
        let policy = AccessPolicy::board_defaults();
        assert_eq!(policy.requirement_for("/members/me"), Requirement::Authenticated);
        assert_eq!(policy.requirement_for("/admin"), Requirement::Authenticated);
        assert_eq!(AccessPolicy::new(vec![]).decide("/posts", &RequestIdentity::Anonymous), GateDecision::Reject);
    }

    #[test]
    fn board_gate_scenarios() {
        let policy = AccessPolicy::board_defaults();
        assert_eq!(policy.decide("/posts", &RequestIdentity::Anonymous), GateDecision::Proceed);
        assert_eq!(policy.decide("/posts/add", &RequestIdentity::Anonymous), GateDecision::Reject);
        assert_eq!(policy.decide("/posts/add", &alice()), GateDecision::Proceed);
        // Delete passes the gate; ownership is enforced by the handler.
        assert_eq!(policy.decide("/posts/3/delete", &alice()), GateDecision::Proceed);
        assert_eq!(policy.decide("/members/login", &RequestIdentity::Anonymous), GateDecision::Proceed);
        assert_eq!(policy.decide("/css/site.css", &RequestIdentity::Anonymous), GateDecision::Proceed);
    }
}
