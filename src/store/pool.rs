//! `SQLite` connection pooling.
//!
//! Every pooled connection is customised once, when r2d2 opens it, so that
//! WAL mode and the busy timeout hold no matter which connection a command
//! lands on.

use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::config::DatabaseConfig;
use crate::error::StorageError;

/// Alias for the connection pool type.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Alias for a pooled connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Maximum time to wait for a free connection.
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u32,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            "PRAGMA busy_timeout = {};\
             PRAGMA journal_mode = WAL;\
             PRAGMA synchronous = NORMAL;",
            self.busy_timeout_ms
        ))
    }
}

/// Open a file-backed pool sized from `config`.
pub fn new_file(path: &Path, config: &DatabaseConfig) -> Result<ConnectionPool, StorageError> {
    build(SqliteConnectionManager::file(path), config.pool_size, config)
}

/// Open an in-memory pool.
///
/// Each in-memory connection is a separate database, so the pool holds
/// exactly one connection.
pub fn new_in_memory(config: &DatabaseConfig) -> Result<ConnectionPool, StorageError> {
    build(SqliteConnectionManager::memory(), 1, config)
}

fn build(
    manager: SqliteConnectionManager,
    max_size: u32,
    config: &DatabaseConfig,
) -> Result<ConnectionPool, StorageError> {
    let pool = Pool::builder()
        .max_size(max_size)
        .connection_timeout(CHECKOUT_TIMEOUT)
        .connection_customizer(Box::new(PragmaCustomizer {
            busy_timeout_ms: config.busy_timeout_ms,
        }))
        .build(manager)?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journal_mode(conn: &Connection) -> String {
        conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn file_pool_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let pool = new_file(&dir.path().join("acro.db"), &DatabaseConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        assert_eq!(journal_mode(&conn), "wal");

        let timeout: i64 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, i64::from(DatabaseConfig::default().busy_timeout_ms));
    }

    #[test]
    fn in_memory_pool_has_one_connection() {
        let pool = new_in_memory(&DatabaseConfig::default()).unwrap();
        assert_eq!(pool.max_size(), 1);
        let conn = pool.get().unwrap();
        assert_eq!(journal_mode(&conn), "memory");
    }
}
