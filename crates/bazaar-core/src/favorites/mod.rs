//! Local-first favorites with opportunistic cloud sync.
//!
//! The local store is the source of truth. Every operation succeeds or fails
//! on local storage alone; remote calls are attempted afterwards and their
//! failures are logged, never returned. A rejected session (401/403) is
//! cleared so later calls run in anonymous mode.

mod toggle;

use std::collections::HashSet;

use serde_json::json;

use crate::auth::IdentityResolver;
use crate::db::FavoriteRepository;
use crate::error::{Error, Result};
use crate::models::{FavoriteRecord, OwnerScope};
use crate::pocketbase::{collections, ApiError, Filter, ListOptions, RecordApi, RemoteFavoriteRecord};

pub use toggle::{FavoriteToggle, PendingToggle, ToggleState};

/// Outcome of a bulk sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records considered
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl SyncReport {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.attempted == 0
    }
}

/// Favorites for the current identity
pub struct FavoritesService<S, A, I> {
    store: S,
    remote: A,
    identity: I,
    cloud_sync_enabled: bool,
}

impl<S, A, I> FavoritesService<S, A, I>
where
    S: FavoriteRepository,
    A: RecordApi,
    I: IdentityResolver,
{
    pub const fn new(store: S, remote: A, identity: I, cloud_sync_enabled: bool) -> Self {
        Self {
            store,
            remote,
            identity,
            cloud_sync_enabled,
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn cloud_sync_enabled(&self) -> bool {
        self.cloud_sync_enabled
    }

    fn scope(&self) -> OwnerScope {
        OwnerScope::from_user_id(self.identity.current_user_id().as_deref())
    }

    /// User to mirror writes for, when cloud sync applies to this call
    fn cloud_user(&self) -> Option<String> {
        if self.cloud_sync_enabled && self.identity.is_authenticated() {
            self.identity.current_user_id()
        } else {
            None
        }
    }

    fn authenticated_user(&self) -> Option<String> {
        if self.identity.is_authenticated() {
            self.identity.current_user_id()
        } else {
            None
        }
    }

    fn handle_remote_error(&self, action: &str, error: &ApiError) {
        if error.is_auth_failure() {
            tracing::warn!("Session rejected while trying to {action}: {error}. Signing out");
            self.identity.clear_session();
        } else {
            tracing::warn!("Failed to {action}: {error}");
        }
    }

    /// Save `bazaar_id` for the current identity, then mirror it remotely.
    ///
    /// Only local storage errors are returned.
    pub async fn add_to_favorites(&self, bazaar_id: &str) -> Result<()> {
        let bazaar_id = require_id(bazaar_id)?;
        let scope = self.scope();
        let key = scope.favorite_key(bazaar_id);

        let record = match self.store.get(&key).await? {
            Some(existing) if existing.synced_to_cloud => {
                tracing::debug!("Bazaar {} is already a synced favorite", bazaar_id);
                return Ok(());
            }
            Some(existing) => existing,
            None => {
                let record = FavoriteRecord::new(&scope, bazaar_id);
                self.store.put(&record).await?;
                record
            }
        };

        let Some(user_id) = self.cloud_user() else {
            return Ok(());
        };
        let body = json!({ "user": user_id, "bazaar": bazaar_id });
        match self
            .remote
            .create::<RemoteFavoriteRecord>(collections::FAVORITES, &body)
            .await
        {
            Ok(remote) => {
                tracing::debug!("Created remote favorite {} for {}", remote.id, bazaar_id);
                self.store.mark_synced(&record.id, &user_id).await?;
            }
            Err(error) => self.handle_remote_error("create remote favorite", &error),
        }
        Ok(())
    }

    /// Forget `bazaar_id` locally, then delete every matching remote row.
    pub async fn remove_from_favorites(&self, bazaar_id: &str) -> Result<()> {
        let bazaar_id = require_id(bazaar_id)?;
        self.store.delete(&self.scope().favorite_key(bazaar_id)).await?;

        let Some(user_id) = self.cloud_user() else {
            return Ok(());
        };
        let options = ListOptions::new().filter(Filter::all().eq("user", &user_id).eq("bazaar", bazaar_id));
        let rows = match self
            .remote
            .get_full_list::<RemoteFavoriteRecord>(collections::FAVORITES, &options)
            .await
        {
            Ok(rows) => rows,
            Err(error) => {
                self.handle_remote_error("look up remote favorites", &error);
                return Ok(());
            }
        };

        for row in rows {
            if let Err(error) = self.remote.delete(collections::FAVORITES, &row.id).await {
                self.handle_remote_error("delete remote favorite", &error);
                if error.is_auth_failure() {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Whether `bazaar_id` is saved for the current identity. Lookup errors
    /// read as "not a favorite".
    pub async fn is_favorite(&self, bazaar_id: &str) -> bool {
        let key = self.scope().favorite_key(bazaar_id.trim());
        match self.store.get(&key).await {
            Ok(record) => record.is_some(),
            Err(error) => {
                tracing::error!("Failed to look up favorite {}: {}", key, error);
                false
            }
        }
    }

    /// Favorited bazaar ids of the current identity, newest first
    pub async fn get_favorite_ids(&self) -> Result<Vec<String>> {
        let scope = self.scope();
        let records = self.store.list_by_owner(scope.user_id()).await?;

        let mut seen = HashSet::new();
        Ok(records
            .into_iter()
            .map(|record| record.bazaar_id)
            .filter(|id| seen.insert(id.clone()))
            .collect())
    }

    pub async fn get_favorite_count(&self) -> Result<usize> {
        self.store.count_by_owner(self.scope().user_id()).await
    }

    /// Pull the user's remote favorites into the local store (additive).
    pub async fn sync_favorites_from_cloud(&self) -> Result<SyncReport> {
        let Some(user_id) = self.authenticated_user() else {
            return Ok(SyncReport::default());
        };

        let options = ListOptions::new()
            .filter(Filter::all().eq("user", &user_id))
            .sort("-created");
        let rows = match self
            .remote
            .get_full_list::<RemoteFavoriteRecord>(collections::FAVORITES, &options)
            .await
        {
            Ok(rows) => rows,
            Err(error) => {
                self.handle_remote_error("fetch remote favorites", &error);
                return Ok(SyncReport::default());
            }
        };

        let mut report = SyncReport::default();
        for row in rows {
            report.attempted += 1;
            if row.bazaar.trim().is_empty() {
                tracing::warn!("Skipping remote favorite {} without a bazaar", row.id);
                report.failed += 1;
                continue;
            }
            self.store
                .put(&FavoriteRecord::from_remote(&user_id, &row.bazaar, &row.created))
                .await?;
            report.succeeded += 1;
        }

        tracing::info!("Pulled {} remote favorite(s)", report.succeeded);
        Ok(report)
    }

    /// Upload unsynced anonymous favorites and the current user's own,
    /// moving each uploaded one into the user's scope.
    ///
    /// A failed item never stops the batch; a rejected session does.
    pub async fn sync_local_favorites_to_cloud(&self) -> Result<SyncReport> {
        let Some(user_id) = self.authenticated_user() else {
            return Ok(SyncReport::default());
        };

        let mut report = SyncReport::default();
        for queued in self.store.list_unsynced().await? {
            if queued
                .user_id
                .as_deref()
                .is_some_and(|owner| owner != user_id)
            {
                continue;
            }
            // Earlier merges in this batch may have moved or synced it
            let Some(record) = self.store.get(&queued.id).await? else {
                continue;
            };
            if record.synced_to_cloud {
                continue;
            }
            report.attempted += 1;

            let user_key = OwnerScope::User(user_id.clone()).favorite_key(&record.bazaar_id);
            if user_key != record.id
                && self
                    .store
                    .get(&user_key)
                    .await?
                    .is_some_and(|existing| existing.synced_to_cloud)
            {
                // Already mirrored remotely for this user
                self.store.mark_synced(&record.id, &user_id).await?;
                report.succeeded += 1;
                continue;
            }

            let body = json!({ "user": user_id, "bazaar": record.bazaar_id });
            match self
                .remote
                .create::<RemoteFavoriteRecord>(collections::FAVORITES, &body)
                .await
            {
                Ok(_) => {
                    self.store.mark_synced(&record.id, &user_id).await?;
                    report.succeeded += 1;
                }
                Err(error) => {
                    report.failed += 1;
                    self.handle_remote_error(
                        &format!("upload favorite {}", record.bazaar_id),
                        &error,
                    );
                    if error.is_auth_failure() {
                        break;
                    }
                }
            }
        }

        if !report.is_empty() {
            tracing::info!(
                "Uploaded {}/{} local favorite(s)",
                report.succeeded,
                report.attempted
            );
        }
        Ok(report)
    }

    /// Delete every local favorite of every owner
    pub async fn clear_all_data(&self) -> Result<u64> {
        let removed = self.store.clear().await?;
        tracing::info!("Cleared {} local favorite(s)", removed);
        Ok(removed)
    }
}

fn require_id(bazaar_id: &str) -> Result<&str> {
    let trimmed = bazaar_id.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("bazaar id must not be empty".to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::services::DatabaseService;

    /// Identity whose session can be switched and observed
    #[derive(Clone, Default)]
    pub struct TestIdentity {
        user: Arc<Mutex<Option<String>>>,
        cleared: Arc<AtomicBool>,
    }

    impl TestIdentity {
        pub fn signed_in(user_id: &str) -> Self {
            let identity = Self::default();
            identity.sign_in(user_id);
            identity
        }

        pub fn sign_in(&self, user_id: &str) {
            *self.user.lock().unwrap() = Some(user_id.to_string());
        }

        pub fn was_cleared(&self) -> bool {
            self.cleared.load(Ordering::SeqCst)
        }
    }

    impl IdentityResolver for TestIdentity {
        fn current_user_id(&self) -> Option<String> {
            self.user.lock().unwrap().clone()
        }

        fn is_authenticated(&self) -> bool {
            self.user.lock().unwrap().is_some()
        }

        fn clear_session(&self) {
            *self.user.lock().unwrap() = None;
            self.cleared.store(true, Ordering::SeqCst);
        }
    }

    /// Store whose every call fails
    pub struct BrokenStore;

    fn broken<T>() -> Result<T> {
        Err(Error::Database("disk I/O error".to_string()))
    }

    impl FavoriteRepository for BrokenStore {
        async fn put(&self, _record: &FavoriteRecord) -> Result<()> {
            broken()
        }
        async fn delete(&self, _id: &str) -> Result<()> {
            broken()
        }
        async fn get(&self, _id: &str) -> Result<Option<FavoriteRecord>> {
            broken()
        }
        async fn list_by_owner(&self, _owner: Option<&str>) -> Result<Vec<FavoriteRecord>> {
            broken()
        }
        async fn count_by_owner(&self, _owner: Option<&str>) -> Result<usize> {
            broken()
        }
        async fn list_unsynced(&self) -> Result<Vec<FavoriteRecord>> {
            broken()
        }
        async fn mark_synced(&self, _id: &str, _user_id: &str) -> Result<bool> {
            broken()
        }
        async fn clear(&self) -> Result<u64> {
            broken()
        }
    }

    pub async fn memory_store() -> DatabaseService {
        DatabaseService::open_in_memory().await.unwrap()
    }
}
