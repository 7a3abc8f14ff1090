//! Favorite model and owner scoping

use std::fmt;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use super::parse_timestamp;

/// Key prefix used for favorites saved while signed out.
pub const ANONYMOUS_SCOPE: &str = "local";

/// Partition that a favorite belongs to: the anonymous device scope or a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerScope {
    Anonymous,
    User(String),
}

impl OwnerScope {
    /// Build a scope from an optional user id. Blank ids are anonymous.
    #[must_use]
    pub fn from_user_id(user_id: Option<&str>) -> Self {
        match user_id.map(str::trim) {
            Some(id) if !id.is_empty() => Self::User(id.to_string()),
            _ => Self::Anonymous,
        }
    }

    /// The user id for authenticated scopes.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(id),
        }
    }

    /// Prefix used in the composite key.
    #[must_use]
    pub fn key_prefix(&self) -> &str {
        self.user_id().unwrap_or(ANONYMOUS_SCOPE)
    }

    /// Composite identity `{scope}_{bazaar_id}`.
    #[must_use]
    pub fn favorite_key(&self, bazaar_id: &str) -> String {
        format!("{}_{}", self.key_prefix(), bazaar_id)
    }
}

impl fmt::Display for OwnerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_prefix())
    }
}

/// A favorited bazaar stored on this device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    /// Composite identity, see [`OwnerScope::favorite_key`]
    pub id: String,
    /// Favorited bazaar
    pub bazaar_id: String,
    /// Owner, `None` for favorites saved while signed out
    pub user_id: Option<String>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Whether a matching remote favorite is known to exist
    pub synced_to_cloud: bool,
}

impl FavoriteRecord {
    /// Create an unsynced favorite for `bazaar_id` in `scope`.
    #[must_use]
    pub fn new(scope: &OwnerScope, bazaar_id: impl Into<String>) -> Self {
        let bazaar_id = bazaar_id.into();
        Self {
            id: scope.favorite_key(&bazaar_id),
            user_id: scope.user_id().map(ToString::to_string),
            bazaar_id,
            created_at: chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            synced_to_cloud: false,
        }
    }

    /// Local mirror of a favorite that already exists remotely.
    ///
    /// `created` is normalized to RFC 3339 when it parses.
    #[must_use]
    pub fn from_remote(user_id: &str, bazaar_id: &str, created: &str) -> Self {
        let created_at = parse_timestamp(created).map_or_else(
            || created.to_string(),
            |parsed| parsed.to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        Self {
            id: OwnerScope::User(user_id.to_string()).favorite_key(bazaar_id),
            bazaar_id: bazaar_id.to_string(),
            user_id: Some(user_id.to_string()),
            created_at,
            synced_to_cloud: true,
        }
    }

    #[must_use]
    pub fn owner_scope(&self) -> OwnerScope {
        OwnerScope::from_user_id(self.user_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_scope_uses_local_prefix() {
        let scope = OwnerScope::from_user_id(None);
        assert_eq!(scope, OwnerScope::Anonymous);
        assert_eq!(scope.favorite_key("baz1"), "local_baz1");
    }

    #[test]
    fn blank_user_id_is_anonymous() {
        assert_eq!(OwnerScope::from_user_id(Some("  ")), OwnerScope::Anonymous);
    }

    #[test]
    fn user_scope_prefixes_key_with_user_id() {
        let scope = OwnerScope::from_user_id(Some("usr1"));
        assert_eq!(scope.favorite_key("baz2"), "usr1_baz2");
        assert_eq!(scope.to_string(), "usr1");
    }

    #[test]
    fn new_record_starts_unsynced() {
        let record = FavoriteRecord::new(&OwnerScope::User("usr1".into()), "5");
        assert_eq!(record.id, "usr1_5");
        assert_eq!(record.user_id.as_deref(), Some("usr1"));
        assert!(!record.synced_to_cloud);
        assert!(chrono::DateTime::parse_from_rfc3339(&record.created_at).is_ok());
    }

    #[test]
    fn remote_record_is_synced_and_keeps_created() {
        let record = FavoriteRecord::from_remote("usr1", "baz1", "2025-01-01 08:30:00.123Z");
        assert_eq!(record.id, "usr1_baz1");
        assert!(record.synced_to_cloud);
        assert_eq!(record.created_at, "2025-01-01T08:30:00.123Z");
        assert_eq!(record.owner_scope(), OwnerScope::User("usr1".into()));
    }
}
