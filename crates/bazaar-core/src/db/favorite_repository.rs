//! Favorite repository implementation

use libsql::{params, Connection, Row};

use crate::error::Result;
use crate::models::{FavoriteRecord, OwnerScope};

const SELECT_COLUMNS: &str = "SELECT id, bazaar_id, user_id, created_at, synced_to_cloud FROM favorites";

/// Local favorites table, keyed by composite identity (async)
///
/// `owner` arguments use `None` for the anonymous scope.
#[allow(async_fn_in_trait)]
pub trait FavoriteRepository {
    /// Insert or replace a favorite by its id
    async fn put(&self, record: &FavoriteRecord) -> Result<()>;

    /// Remove a favorite; absent ids are not an error
    async fn delete(&self, id: &str) -> Result<()>;

    /// Fetch a favorite by id
    async fn get(&self, id: &str) -> Result<Option<FavoriteRecord>>;

    /// All favorites belonging to `owner`, newest first
    async fn list_by_owner(&self, owner: Option<&str>) -> Result<Vec<FavoriteRecord>>;

    /// Number of favorites belonging to `owner`
    async fn count_by_owner(&self, owner: Option<&str>) -> Result<usize>;

    /// Favorites of any owner not yet confirmed remotely
    async fn list_unsynced(&self) -> Result<Vec<FavoriteRecord>>;

    /// Flag the favorite stored under `id` as synced and move it into
    /// `user_id`'s scope, re-keying it to `{user_id}_{bazaar_id}`.
    ///
    /// Returns `false` when no such favorite exists.
    async fn mark_synced(&self, id: &str, user_id: &str) -> Result<bool>;

    /// Delete every favorite, returning how many were removed
    async fn clear(&self) -> Result<u64>;
}

/// libSQL implementation of `FavoriteRepository`
pub struct LibSqlFavoriteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlFavoriteRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_favorite(row: &Row) -> Result<FavoriteRecord> {
        Ok(FavoriteRecord {
            id: row.get(0)?,
            bazaar_id: row.get(1)?,
            user_id: row.get::<Option<String>>(2)?,
            created_at: row.get(3)?,
            synced_to_cloud: row.get::<i32>(4)? != 0,
        })
    }

    async fn collect(&self, mut rows: libsql::Rows) -> Result<Vec<FavoriteRecord>> {
        let mut favorites = Vec::new();
        while let Some(row) = rows.next().await? {
            favorites.push(Self::parse_favorite(&row)?);
        }
        Ok(favorites)
    }
}

impl FavoriteRepository for LibSqlFavoriteRepository<'_> {
    async fn put(&self, record: &FavoriteRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO favorites (id, bazaar_id, user_id, created_at, synced_to_cloud)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    record.id.as_str(),
                    record.bazaar_id.as_str(),
                    record.user_id.clone(),
                    record.created_at.as_str(),
                    i32::from(record.synced_to_cloud)
                ],
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM favorites WHERE id = ?", params![id])
            .await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<FavoriteRecord>> {
        let mut rows = self
            .conn
            .query(&format!("{SELECT_COLUMNS} WHERE id = ?"), params![id])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_favorite(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_by_owner(&self, owner: Option<&str>) -> Result<Vec<FavoriteRecord>> {
        let rows = match owner {
            Some(user_id) => {
                self.conn
                    .query(
                        &format!("{SELECT_COLUMNS} WHERE user_id = ? ORDER BY created_at DESC"),
                        params![user_id],
                    )
                    .await?
            }
            None => {
                self.conn
                    .query(
                        &format!("{SELECT_COLUMNS} WHERE user_id IS NULL ORDER BY created_at DESC"),
                        (),
                    )
                    .await?
            }
        };
        self.collect(rows).await
    }

    async fn count_by_owner(&self, owner: Option<&str>) -> Result<usize> {
        let mut rows = match owner {
            Some(user_id) => {
                self.conn
                    .query(
                        "SELECT COUNT(*) FROM favorites WHERE user_id = ?",
                        params![user_id],
                    )
                    .await?
            }
            None => {
                self.conn
                    .query("SELECT COUNT(*) FROM favorites WHERE user_id IS NULL", ())
                    .await?
            }
        };

        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn list_unsynced(&self) -> Result<Vec<FavoriteRecord>> {
        let rows = self
            .conn
            .query(
                &format!("{SELECT_COLUMNS} WHERE synced_to_cloud = 0 ORDER BY created_at ASC"),
                (),
            )
            .await?;
        self.collect(rows).await
    }

    async fn mark_synced(&self, id: &str, user_id: &str) -> Result<bool> {
        let Some(record) = self.get(id).await? else {
            return Ok(false);
        };
        let new_id = OwnerScope::User(user_id.to_string()).favorite_key(&record.bazaar_id);

        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        let result = async {
            if new_id != id {
                self.conn
                    .execute("DELETE FROM favorites WHERE id = ?", params![id])
                    .await?;
            }
            self.conn
                .execute(
                    "INSERT OR REPLACE INTO favorites (id, bazaar_id, user_id, created_at, synced_to_cloud)
                     VALUES (?, ?, ?, ?, 1)",
                    params![
                        new_id.as_str(),
                        record.bazaar_id.as_str(),
                        user_id,
                        record.created_at.as_str()
                    ],
                )
                .await?;
            Ok::<_, crate::Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                self.conn.execute("COMMIT", ()).await?;
                Ok(true)
            }
            Err(error) => {
                self.conn.execute("ROLLBACK", ()).await.ok();
                Err(error)
            }
        }
    }

    async fn clear(&self) -> Result<u64> {
        Ok(self.conn.execute("DELETE FROM favorites", ()).await?)
    }
}
