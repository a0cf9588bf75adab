use rusqlite::Connection;
use tracing::debug;

use crate::error::StorageError;

/// Current schema version.  Increment when adding new migrations.
const SCHEMA_VERSION: u32 = 1;

/// Apply all pending migrations to `conn` inside a single transaction.
///
/// Tables are created with `IF NOT EXISTS` and the `meta` table records which
/// version has been applied, so re-running is a no-op.
pub fn run_migrations(conn: &mut Connection) -> Result<(), StorageError> {
    let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

    // ------------------------------------------------------------------
    // meta: tracks schema version.
    // ------------------------------------------------------------------
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS meta (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;

    let current_version = get_schema_version(&tx);

    if current_version > SCHEMA_VERSION {
        return Err(StorageError::Migration {
            message: format!(
                "database schema v{current_version} is newer than supported v{SCHEMA_VERSION}"
            ),
        });
    }

    if current_version == SCHEMA_VERSION {
        debug!(version = current_version, "entry schema up to date");
        return Ok(());
    }

    if current_version < 1 {
        migrate_v1(&tx)?;
    }

    set_schema_version(&tx, SCHEMA_VERSION)?;
    tx.commit()?;
    debug!(version = SCHEMA_VERSION, "entry schema migrated");
    Ok(())
}

// ---------------------------------------------------------------------------
// v1: entries and their trigram mirror
// ---------------------------------------------------------------------------

fn migrate_v1(conn: &Connection) -> Result<(), StorageError> {
    // ------------------------------------------------------------------
    // entries: one row per (key, value) pair. `key`/`value` keep the
    // submitted casing; uniqueness and lookups use the `_norm` columns.
    // ------------------------------------------------------------------
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS entries (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            key         TEXT NOT NULL,
            value       TEXT NOT NULL,
            key_norm    TEXT NOT NULL,
            value_norm  TEXT NOT NULL,
            UNIQUE(key_norm, value_norm)
        );",
    )?;

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_entries_key_norm ON entries(key_norm);",
    )?;

    // ------------------------------------------------------------------
    // entries_fts: lowercase trigram mirror of (key, value). Only the
    // triggers below write to it.
    // ------------------------------------------------------------------
    conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS entries_fts USING fts5(
            key,
            value,
            tokenize='trigram'
        );",
    )?;

    conn.execute_batch(
        "CREATE TRIGGER IF NOT EXISTS entries_ai AFTER INSERT ON entries BEGIN
            INSERT INTO entries_fts(rowid, key, value)
            VALUES (new.id, new.key_norm, new.value_norm);
        END;",
    )?;
    conn.execute_batch(
        "CREATE TRIGGER IF NOT EXISTS entries_ad AFTER DELETE ON entries BEGIN
            DELETE FROM entries_fts WHERE rowid = old.id;
        END;",
    )?;
    conn.execute_batch(
        "CREATE TRIGGER IF NOT EXISTS entries_au AFTER UPDATE ON entries BEGIN
            DELETE FROM entries_fts WHERE rowid = old.id;
            INSERT INTO entries_fts(rowid, key, value)
            VALUES (new.id, new.key_norm, new.value_norm);
        END;",
    )?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn get_schema_version(conn: &Connection) -> u32 {
    conn.query_row(
        "SELECT value FROM meta WHERE key = 'schema_version'",
        [],
        |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<u32>().unwrap_or(0))
        },
    )
    .unwrap_or(0)
}

fn set_schema_version(conn: &Connection, version: u32) -> Result<(), StorageError> {
    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', ?1)",
        [version.to_string()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn triggers_mirror_rows_lowercased() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();

        conn.execute(
            "INSERT INTO entries (key, value, key_norm, value_norm)
             VALUES ('HTTP', 'HyperText', 'http', 'hypertext')",
            [],
        )
        .unwrap();
        let mirrored: (String, String) = conn
            .query_row("SELECT key, value FROM entries_fts", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(mirrored, ("http".to_string(), "hypertext".to_string()));

        conn.execute(
            "UPDATE entries SET value = 'Hyper', value_norm = 'hyper'",
            [],
        )
        .unwrap();
        let value: String = conn
            .query_row("SELECT value FROM entries_fts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(value, "hyper");

        conn.execute("DELETE FROM entries", []).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM entries_fts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        set_schema_version(&conn, SCHEMA_VERSION + 1).unwrap();
        let err = run_migrations(&mut conn).unwrap_err();
        assert!(matches!(err, StorageError::Migration { .. }));
    }
}
