//! Named store management.
//!
//! Stores are created lazily by name and deleted wholesale. There is no
//! partial eviction: the only way entries disappear in bulk is through
//! [`CacheStorage::delete_store`].

use super::connection::CacheStorage;
use crate::Error;
use tokio_rusqlite::params;

/// Handle to one named store.
///
/// Obtained from [`CacheStorage::open_store`]. The handle stays valid after
/// the store is deleted; writes through it then fail and reads miss.
#[derive(Clone, Debug)]
pub struct Store {
    pub(crate) storage: CacheStorage,
    pub(crate) name: String,
}

impl Store {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CacheStorage {
    /// Handle to a store without creating it.
    ///
    /// Reads through the handle miss and writes fail until the store is
    /// opened with [`CacheStorage::open_store`].
    pub fn store(&self, name: &str) -> Store {
        Store { storage: self.clone(), name: name.to_string() }
    }

    /// Open a store, creating it if absent.
    pub async fn open_store(&self, name: &str) -> Result<Store, Error> {
        let owned = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![owned, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(Store { storage: self.clone(), name: name.to_string() })
    }

    /// Names of every store ever created and not yet deleted, sorted.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a store exists.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and, by cascade, all of its entries.
    ///
    /// Returns false if the store did not exist.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}
