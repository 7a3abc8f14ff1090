//! Shared favorites database service used by the CLI and the favorites core.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{Database, FavoriteRepository, LibSqlFavoriteRepository};
use crate::models::FavoriteRecord;
use crate::Result;

/// Thread-safe handle to the local favorites database.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open the database at the given filesystem path.
    ///
    /// A file that is not a database is moved aside and a fresh one created.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let db = match Database::open(&db_path).await {
            Ok(db) => db,
            Err(error) if Self::is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Local favorites DB at {} is unreadable: {}. Starting a fresh one.",
                    db_path.display(),
                    error
                );
                Self::quarantine_corrupted_db_files(&db_path)?;
                Database::open(&db_path).await?
            }
            Err(error) => return Err(error),
        };

        tracing::debug!("Opened favorites DB at {}", db_path.display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Filesystem location, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn is_corrupted_db_error(error: &crate::Error) -> bool {
        let message = error.to_string().to_ascii_lowercase();
        message.contains("file is not a database") || message.contains("database disk image is malformed")
    }

    fn quarantine_corrupted_db_files(db_path: &Path) -> Result<()> {
        if db_path.exists() {
            let timestamp = chrono::Utc::now().timestamp_millis();
            let base_name = db_path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("bazaar.db");
            let backup_path = db_path.with_file_name(format!("{base_name}.corrupt-{timestamp}"));

            std::fs::rename(db_path, &backup_path)?;
            tracing::warn!(
                "Moved corrupted favorites DB from {} to {}",
                db_path.display(),
                backup_path.display()
            );
        }

        let Some(parent) = db_path.parent().filter(|parent| parent.exists()) else {
            return Ok(());
        };
        let Some(base_name) = db_path.file_name().and_then(|name| name.to_str()) else {
            return Ok(());
        };
        // WAL and shared-memory sidecars belong to the old file
        let sidecars = [format!("{base_name}-wal"), format!("{base_name}-shm")];

        for entry in std::fs::read_dir(parent)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if sidecars.iter().any(|sidecar| file_name == sidecar.as_str()) {
                let path = entry.path();
                std::fs::remove_file(&path)?;
                tracing::warn!("Removed stale DB sidecar {}", path.display());
            }
        }

        Ok(())
    }

    async fn reopen_after_corruption(&self) -> Result<bool> {
        let Some(db_path) = self.db_path.clone() else {
            return Ok(false);
        };

        tracing::warn!(
            "Detected invalid favorites DB file; reopening at {}",
            db_path.display()
        );

        let mut db = self.db.lock().await;
        let placeholder = Database::open_in_memory().await?;
        drop(std::mem::replace(&mut *db, placeholder));

        Self::quarantine_corrupted_db_files(&db_path)?;
        *db = Database::open(&db_path).await?;
        Ok(true)
    }
}

impl FavoriteRepository for DatabaseService {
    async fn put(&self, record: &FavoriteRecord) -> Result<()> {
        let first_attempt = {
            let db = self.db.lock().await;
            let repo = LibSqlFavoriteRepository::new(db.connection());
            repo.put(record).await
        };

        match first_attempt {
            Err(error) if Self::is_corrupted_db_error(&error) => {
                if self.reopen_after_corruption().await? {
                    let db = self.db.lock().await;
                    let repo = LibSqlFavoriteRepository::new(db.connection());
                    repo.put(record).await
                } else {
                    Err(error)
                }
            }
            other => other,
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlFavoriteRepository::new(db.connection());
        repo.delete(id).await
    }

    async fn get(&self, id: &str) -> Result<Option<FavoriteRecord>> {
        let db = self.db.lock().await;
        let repo = LibSqlFavoriteRepository::new(db.connection());
        repo.get(id).await
    }

    async fn list_by_owner(&self, owner: Option<&str>) -> Result<Vec<FavoriteRecord>> {
        let first_attempt = {
            let db = self.db.lock().await;
            let repo = LibSqlFavoriteRepository::new(db.connection());
            repo.list_by_owner(owner).await
        };

        match first_attempt {
            Err(error) if Self::is_corrupted_db_error(&error) => {
                if self.reopen_after_corruption().await? {
                    let db = self.db.lock().await;
                    let repo = LibSqlFavoriteRepository::new(db.connection());
                    repo.list_by_owner(owner).await
                } else {
                    Err(error)
                }
            }
            other => other,
        }
    }

    async fn count_by_owner(&self, owner: Option<&str>) -> Result<usize> {
        let db = self.db.lock().await;
        let repo = LibSqlFavoriteRepository::new(db.connection());
        repo.count_by_owner(owner).await
    }

    async fn list_unsynced(&self) -> Result<Vec<FavoriteRecord>> {
        let db = self.db.lock().await;
        let repo = LibSqlFavoriteRepository::new(db.connection());
        repo.list_unsynced().await
    }

    async fn mark_synced(&self, id: &str, user_id: &str) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = LibSqlFavoriteRepository::new(db.connection());
        repo.mark_synced(id, user_id).await
    }

    async fn clear(&self) -> Result<u64> {
        let db = self.db.lock().await;
        let repo = LibSqlFavoriteRepository::new(db.connection());
        repo.clear().await
    }
}
