//! Shared holder of the current session.

use std::sync::{Arc, PoisonError, RwLock};

use super::{AuthResult, AuthSession, SessionPersistence};

/// "Who is signed in", as seen by the favorites core
pub trait IdentityResolver {
    /// Id of the signed-in user, `None` when anonymous
    fn current_user_id(&self) -> Option<String>;

    fn is_authenticated(&self) -> bool;

    /// Drop the session after the backend rejected it
    fn clear_session(&self);
}

/// Cloneable handle to the current session, optionally persisted
///
/// All clones share one session. The HTTP client reads the token from here
/// and the favorites service reads the user id.
#[derive(Clone, Default)]
pub struct AuthStore {
    session: Arc<RwLock<Option<AuthSession>>>,
    persistence: Option<Arc<dyn SessionPersistence>>,
}

impl AuthStore {
    /// Memory-only store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_persistence(persistence: Arc<dyn SessionPersistence>) -> Self {
        Self {
            session: Arc::default(),
            persistence: Some(persistence),
        }
    }

    /// Load the persisted session. Expired or undecodable sessions are
    /// discarded and removed from persistence.
    pub fn restore(&self) -> AuthResult<Option<AuthSession>> {
        let Some(persistence) = &self.persistence else {
            return Ok(self.session());
        };
        let Some(stored) = persistence.load_session()? else {
            return Ok(None);
        };

        if stored.is_valid() {
            self.set(Some(stored.clone()));
            Ok(Some(stored))
        } else {
            tracing::info!("Discarding expired session for user {}", stored.record.id);
            persistence.clear_session()?;
            self.set(None);
            Ok(None)
        }
    }

    /// Replace the current session and persist it
    pub fn save(&self, session: AuthSession) -> AuthResult<()> {
        if let Some(persistence) = &self.persistence {
            persistence.save_session(&session)?;
        }
        self.set(Some(session));
        Ok(())
    }

    /// Forget the session. Memory is cleared even if persistence fails.
    pub fn clear(&self) -> AuthResult<()> {
        self.set(None);
        match &self.persistence {
            Some(persistence) => persistence.clear_session(),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<AuthSession> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session().map(|session| session.token)
    }

    /// Session present and not expired
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.session().is_some_and(|session| session.is_valid())
    }

    fn set(&self, session: Option<AuthSession>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }
}

impl IdentityResolver for AuthStore {
    fn current_user_id(&self) -> Option<String> {
        self.session()
            .filter(AuthSession::is_valid)
            .map(|session| session.record.id)
    }

    fn is_authenticated(&self) -> bool {
        self.is_valid()
    }

    fn clear_session(&self) {
        if let Err(error) = self.clear() {
            tracing::warn!("Failed to clear persisted session: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::auth::test_support::{expired_session_for, session_for};
    use crate::auth::AuthError;

    #[derive(Default)]
    struct MemoryPersistence {
        stored: Mutex<Option<AuthSession>>,
        fail_clear: bool,
    }

    impl SessionPersistence for MemoryPersistence {
        fn load_session(&self) -> AuthResult<Option<AuthSession>> {
            Ok(self.stored.lock().unwrap().clone())
        }

        fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
            *self.stored.lock().unwrap() = Some(session.clone());
            Ok(())
        }

        fn clear_session(&self) -> AuthResult<()> {
            if self.fail_clear {
                return Err(AuthError::SecureStorage("locked".to_string()));
            }
            *self.stored.lock().unwrap() = None;
            Ok(())
        }
    }

    #[test]
    fn empty_store_is_anonymous() {
        let store = AuthStore::new();
        assert!(!store.is_authenticated());
        assert_eq!(store.current_user_id(), None);
        assert_eq!(store.token(), None);
    }

    #[test]
    fn clones_share_the_session() {
        let store = AuthStore::new();
        let clone = store.clone();
        store.save(session_for("usr1")).unwrap();

        assert!(clone.is_authenticated());
        assert_eq!(clone.current_user_id().as_deref(), Some("usr1"));

        clone.clear_session();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn expired_session_is_not_authenticated() {
        let store = AuthStore::new();
        store.save(expired_session_for("usr1")).unwrap();

        assert!(!store.is_authenticated());
        assert_eq!(store.current_user_id(), None);
        assert!(store.token().is_some());
    }

    #[test]
    fn restore_loads_valid_session() {
        let persistence = Arc::new(MemoryPersistence::default());
        persistence.save_session(&session_for("usr1")).unwrap();

        let store = AuthStore::with_persistence(persistence);
        let restored = store.restore().unwrap().unwrap();
        assert_eq!(restored.record.id, "usr1");
        assert!(store.is_authenticated());
    }

    #[test]
    fn restore_discards_expired_session() {
        let persistence = Arc::new(MemoryPersistence::default());
        persistence.save_session(&expired_session_for("usr1")).unwrap();

        let store = AuthStore::with_persistence(persistence.clone());
        assert!(store.restore().unwrap().is_none());
        assert!(persistence.load_session().unwrap().is_none());
    }

    #[test]
    fn clear_session_empties_memory_even_when_persistence_fails() {
        let persistence = Arc::new(MemoryPersistence {
            fail_clear: true,
            ..MemoryPersistence::default()
        });
        let store = AuthStore::with_persistence(persistence);
        store.save(session_for("usr1")).unwrap();

        store.clear_session();
        assert!(!store.is_authenticated());
        assert!(store.clear().is_err());
    }
}
