//! SQLite-backed key-value store.
//!
//! Provides persistent storage for:
//! - String keys with optional expiry (hero state, cached aggregates)
//! - Sets (waitlist members, known stats users)
//! - Hashes (per-user stats, signup timestamps)

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, migrations, KvStore};
use crate::error::{DatabaseError, Result};

/// SQLite database implementing [`KvStore`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/syclar.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("syclar.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        tracing::debug!(path = %path.display(), "opened store");
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn)?;
        Ok(())
    }

    /// Drop expired string keys. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let n = self.conn.execute(
            "DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            params![Utc::now().timestamp()],
        )?;
        Ok(n)
    }

    fn put(&self, key: &str, value: &str, expires_at: Option<i64>) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, expires_at) VALUES (?1, ?2, ?3)",
            params![key, value, expires_at],
        )?;
        Ok(())
    }
}

impl KvStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv
                 WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                params![key, Utc::now().timestamp()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.put(key, value, None)
    }

    fn set_ex(&self, key: &str, ttl_secs: u64, value: &str) -> Result<()> {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        let expires_at = Utc::now().timestamp().saturating_add(ttl);
        self.put(key, value, Some(expires_at))
    }

    fn del(&self, key: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        tx.execute("DELETE FROM sets WHERE key = ?1", params![key])?;
        tx.execute("DELETE FROM hashes WHERE key = ?1", params![key])?;
        tx.commit()?;
        Ok(())
    }

    fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO sets (key, member) VALUES (?1, ?2)",
            params![key, member],
        )?;
        Ok(inserted > 0)
    }

    fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sets WHERE key = ?1 AND member = ?2",
                params![key, member],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn scard(&self, key: &str) -> Result<u64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM sets WHERE key = ?1",
            params![key],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(n.max(0) as u64)
    }

    fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT member FROM sets WHERE key = ?1 ORDER BY member")?;
        let rows = stmt.query_map(params![key], |row| row.get::<_, String>(0))?;
        let mut members = Vec::new();
        for row in rows {
            members.push(row?);
        }
        Ok(members)
    }

    fn hset(&self, key: &str, fields: &BTreeMap<String, String>) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO hashes (key, field, value) VALUES (?1, ?2, ?3)",
            )?;
            for (field, value) in fields {
                stmt.execute(params![key, field, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT field, value FROM hashes WHERE key = ?1")?;
        let rows = stmt.query_map(params![key], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut map = BTreeMap::new();
        for row in rows {
            let (field, value) = row?;
            map.insert(field, value);
        }
        Ok(map)
    }
}
