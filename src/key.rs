//! Match key module.
//!
//! Provides the `MatchKey` type, the composite identity string a feature
//! is filed under in the bonus index. Uses `Arc<str>` so the index can hand
//! keys around cheaply.

use std::sync::Arc;

/// The separator between a feature kind and the name it targets.
pub const SEPARATOR: char = '/';

/// The name part of a wildcard key.
pub const WILDCARD: &str = "*";

/// Interned composite key: `"<kind>/<exact name>"` or `"<kind>/*"`.
///
/// # Examples
///
/// ```rust
/// use gurps_bonus::MatchKey;
///
/// let exact = MatchKey::exact("skill", "Karate");
/// assert_eq!(exact.as_str(), "skill/Karate");
/// assert!(!exact.is_wildcard());
///
/// let wildcard = MatchKey::wildcard("skill");
/// assert_eq!(wildcard.as_str(), "skill/*");
/// assert!(wildcard.is_wildcard());
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchKey(Arc<str>);

impl MatchKey {
    /// Key for a feature that targets exactly one name.
    pub fn exact(kind: &str, name: &str) -> Self {
        Self(Arc::from(format!("{kind}{SEPARATOR}{name}")))
    }

    /// Key for a feature that must be scanned against every candidate.
    pub fn wildcard(kind: &str) -> Self {
        Self(Arc::from(format!("{kind}{SEPARATOR}{WILDCARD}")))
    }

    /// The string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The kind prefix.
    pub fn kind(&self) -> &str {
        self.0
            .split_once(SEPARATOR)
            .map(|(kind, _)| kind)
            .unwrap_or(self.as_str())
    }

    /// Whether this is a wildcard bucket.
    pub fn is_wildcard(&self) -> bool {
        self.0
            .split_once(SEPARATOR)
            .is_some_and(|(_, name)| name == WILDCARD)
    }
}

impl From<&str> for MatchKey {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for MatchKey {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl std::fmt::Display for MatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_key_creation() {
        let k1 = MatchKey::exact("skill", "Karate");
        let k2: MatchKey = "skill/Karate".into();
        assert_eq!(k1, k2);
        assert_eq!(k1.kind(), "skill");
    }

    #[test]
    fn test_match_key_kind_with_dots() {
        let key = MatchKey::wildcard("spell.college");
        assert_eq!(key.kind(), "spell.college");
        assert!(key.is_wildcard());
    }

    #[test]
    fn test_name_containing_separator() {
        let key = MatchKey::exact("skill", "Guns/Pistol");
        assert_eq!(key.kind(), "skill");
        assert!(!key.is_wildcard());
    }
}
