//! Fragment search over keys and values.
//!
//! Queries of [`MIN_FRAGMENT_LEN`] characters or more are cut into their
//! overlapping trigrams and matched against the `entries_fts` mirror, so a
//! row is found when it shares any fragment with the query. Rows holding
//! the whole query rank above rows that only share fragments; within a tier
//! `bm25()` decides. Shorter queries cannot be resolved by trigrams, so they
//! fall back to a plain substring scan of the primary relation.
//!
//! Every hit reports its key through the key's oldest row, the same display
//! casing [`Store::get`] uses.

mod rank;

pub use rank::{best_per_key, Hit};

use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;
use crate::store::{normalize, Store};

/// Shortest query the trigram index can answer.
pub const MIN_FRAGMENT_LEN: usize = 3;

/// Read-only search over the store's mirror. Each call is independent.
#[derive(Clone)]
pub struct SearchEngine {
    store: Store,
    limit: usize,
}

impl SearchEngine {
    pub fn new(store: Store, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Keys whose key or value text shares a fragment with `query`, most
    /// relevant first.
    pub fn search(&self, query: &str) -> Result<Vec<String>> {
        let needle = normalize(query);
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.store.connection()?;
        let short = needle.chars().count() < MIN_FRAGMENT_LEN;
        let hits = if short {
            substring_scan(&conn, &needle)?
        } else {
            fragment_match(&conn, &needle)?
        };

        let keys = best_per_key(hits, self.limit);
        debug!(query = %needle, fallback = short, results = keys.len(), "search");
        Ok(keys)
    }
}

/// Distinct trigrams of `needle`, in order of first appearance.
fn fragments(needle: &str) -> Vec<String> {
    let chars: Vec<char> = needle.chars().collect();
    let mut out: Vec<String> = Vec::new();
    for window in chars.windows(MIN_FRAGMENT_LEN) {
        let fragment: String = window.iter().collect();
        if !out.contains(&fragment) {
            out.push(fragment);
        }
    }
    out
}

/// FTS5 query matching any fragment of `needle`.
///
/// Each fragment is quoted as its own phrase so user text never reaches the
/// query syntax.
fn fts_query(needle: &str) -> String {
    fragments(needle)
        .iter()
        .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Trigram match. Tier 0 holds the whole query in the key, tier 1 in the
/// value, tier 2 shares fragments only; `bm25` weights key above value.
fn fragment_match(conn: &Connection, needle: &str) -> Result<Vec<Hit>> {
    let mut stmt = conn.prepare_cached(
        "SELECT head.id, head.key, e.key_norm,
                CASE
                    WHEN instr(e.key_norm, ?2) > 0 THEN 0
                    WHEN instr(e.value_norm, ?2) > 0 THEN 1
                    ELSE 2
                END AS tier,
                bm25(entries_fts, 2.0, 1.0) AS score
         FROM entries_fts
         JOIN entries e ON e.id = entries_fts.rowid
         JOIN entries head ON head.id =
             (SELECT MIN(id) FROM entries WHERE key_norm = e.key_norm)
         WHERE entries_fts MATCH ?1
         ORDER BY tier, score",
    )?;
    let hits = stmt
        .query_map([fts_query(needle), needle.to_string()], |row| {
            Ok(Hit {
                first_id: row.get(0)?,
                key: row.get(1)?,
                key_norm: row.get(2)?,
                tier: row.get(3)?,
                score: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(hits)
}

/// Case-insensitive substring scan for sub-trigram queries.
///
/// Exact key matches rank first, then keys containing the needle, then rows
/// that only match on the value.
fn substring_scan(conn: &Connection, needle: &str) -> Result<Vec<Hit>> {
    let mut stmt = conn.prepare_cached(
        "SELECT head.id, head.key, e.key_norm,
                CASE
                    WHEN e.key_norm = ?1 THEN 0
                    WHEN instr(e.key_norm, ?1) > 0 THEN 1
                    ELSE 2
                END AS tier
         FROM entries e
         JOIN entries head ON head.id =
             (SELECT MIN(id) FROM entries WHERE key_norm = e.key_norm)
         WHERE instr(e.key_norm, ?1) > 0 OR instr(e.value_norm, ?1) > 0
         ORDER BY tier, e.id",
    )?;
    let hits = stmt
        .query_map([needle], |row| {
            Ok(Hit {
                first_id: row.get(0)?,
                key: row.get(1)?,
                key_norm: row.get(2)?,
                tier: row.get(3)?,
                score: 0.0,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(hits)
}
