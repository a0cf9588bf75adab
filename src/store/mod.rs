//! The entry store: the canonical key → values relation.
//!
//! Every mutation runs in one `BEGIN IMMEDIATE` transaction. The trigram
//! mirror (`entries_fts`) is written by triggers inside that same
//! transaction, so a failed or abandoned call leaves both the relation and
//! its index untouched. Uniqueness and lookups go through [`normalize`];
//! the submitted casing is only kept for display.

mod pool;
mod schema;

pub use pool::{ConnectionPool, PooledConnection};

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use rand::seq::SliceRandom;
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::{Error, Result, StorageError};

/// Canonical form used for uniqueness, lookups and the search mirror.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// A key and its values in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Display casing of the key (taken from its oldest row).
    pub key: String,
    pub values: Vec<String>,
}

/// Handle to the entry relation. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Store {
    pool: ConnectionPool,
}

impl Store {
    /// Open (or create) the database at `path` and apply migrations.
    pub fn open(path: &Path, config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }

        let store = Self::with_pool(pool::new_file(path, config)?)?;
        info!(db = %path.display(), "entry store ready");
        Ok(store)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_pool(pool::new_in_memory(&DatabaseConfig::default())?)
    }

    fn with_pool(pool: ConnectionPool) -> Result<Self> {
        let mut conn = pool.get()?;
        schema::run_migrations(&mut conn)?;
        drop(conn);
        Ok(Self { pool })
    }

    /// Check a connection out of the pool for read-only queries.
    pub(crate) fn connection(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Insert every `(key, value)` pair that is not already present
    /// (case-insensitively). Returns the values actually inserted, which is
    /// empty when all of them were duplicates.
    pub fn add(&self, key: &str, values: &[String]) -> Result<Vec<String>> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(Vec::new());
        }
        let key_norm = normalize(key);

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut inserted = Vec::new();
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO entries (key, value, key_norm, value_norm)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key_norm, value_norm) DO NOTHING",
            )?;
            for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
                if stmt.execute(params![key, value, key_norm, normalize(value)])? > 0 {
                    inserted.push(value.to_string());
                }
            }
        }
        tx.commit()?;

        debug!(key, requested = values.len(), inserted = inserted.len(), "add");
        Ok(inserted)
    }

    /// Delete the given values of `key`, case-insensitively, and return how
    /// many rows went away.
    ///
    /// Values that are not present are ignored. A key with no rows at all
    /// yields [`Error::NotFound`].
    pub fn remove(&self, key: &str, values: &[String]) -> Result<usize> {
        let key_norm = normalize(key);

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !key_exists(&tx, &key_norm)? {
            return Err(Error::NotFound(key.trim().to_string()));
        }

        let mut removed = 0;
        {
            let mut stmt = tx.prepare_cached(
                "DELETE FROM entries WHERE key_norm = ?1 AND value_norm = ?2",
            )?;
            let targets: HashSet<String> = values.iter().map(|v| normalize(v)).collect();
            for value_norm in &targets {
                removed += stmt.execute(params![key_norm, value_norm])?;
            }
        }
        tx.commit()?;

        debug!(key, requested = values.len(), removed, "remove");
        Ok(removed)
    }

    /// Delete every row of `key`. Returns the number of rows deleted, or
    /// [`Error::NotFound`] if there were none.
    pub fn delete(&self, key: &str) -> Result<usize> {
        let key_norm = normalize(key);

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = tx.execute("DELETE FROM entries WHERE key_norm = ?1", [&key_norm])?;
        if removed == 0 {
            return Err(Error::NotFound(key.trim().to_string()));
        }
        tx.commit()?;

        debug!(key, removed, "delete");
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Values of `key` in insertion order.
    pub fn get(&self, key: &str) -> Result<Entry> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare_cached(
            "SELECT key, value FROM entries WHERE key_norm = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([normalize(key)], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let Some((display_key, _)) = rows.first() else {
            return Err(Error::NotFound(key.trim().to_string()));
        };

        Ok(Entry {
            key: display_key.clone(),
            values: rows.iter().map(|(_, value)| value.clone()).collect(),
        })
    }

    /// Uniform random sample, without replacement, of up to `limit`
    /// distinct keys.
    pub fn list(&self, limit: usize) -> Result<Vec<String>> {
        let keys = self.all_keys()?;
        let mut rng = rand::thread_rng();
        Ok(keys.choose_multiple(&mut rng, limit).cloned().collect())
    }

    /// Every distinct key, in its display casing, oldest first.
    pub fn all_keys(&self) -> Result<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare_cached(
            "SELECT key FROM entries
             WHERE id IN (SELECT MIN(id) FROM entries GROUP BY key_norm)
             ORDER BY id",
        )?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(DISTINCT key_norm) FROM entries", [], |row| {
                row.get(0)
            })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Check that the trigram mirror holds exactly the case-folded content
    /// of the relation.
    pub fn verify_index(&self) -> Result<bool> {
        let conn = self.pool.get()?;
        let primary: BTreeSet<_> = collect_rows(&conn, "SELECT id, key, value FROM entries")?
            .into_iter()
            .map(|(id, key, value)| (id, normalize(&key), normalize(&value)))
            .collect();
        let mirror = collect_rows(&conn, "SELECT rowid, key, value FROM entries_fts")?;
        Ok(primary == mirror)
    }
}

fn key_exists(conn: &rusqlite::Connection, key_norm: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM entries WHERE key_norm = ?1 LIMIT 1",
            [key_norm],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn collect_rows(
    conn: &rusqlite::Connection,
    sql: &str,
) -> Result<BTreeSet<(i64, String, String)>> {
    let mut stmt = conn.prepare(sql)?;
    let rows: BTreeSet<(i64, String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<rusqlite::Result<BTreeSet<_>>>()?;
    Ok(rows)
}
