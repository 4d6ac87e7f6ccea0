//! Options table repository.
//!
//! # Invariants
//! - Option names are unique; `put` overwrites.
//! - Listing is deterministic by name.

use crate::repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for named option values.
pub trait OptionsRepository {
    fn get(&self, name: &str) -> RepoResult<Option<String>>;
    fn put(&self, name: &str, value: &str) -> RepoResult<()>;
    fn remove(&self, name: &str) -> RepoResult<bool>;
    fn list(&self) -> RepoResult<Vec<(String, String)>>;
}

/// SQLite-backed options repository.
pub struct SqliteOptionsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOptionsRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl OptionsRepository for SqliteOptionsRepository<'_> {
    fn get(&self, name: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM options WHERE name = ?1;",
                [name],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, name: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO options (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![name, value],
        )?;
        Ok(())
    }

    fn remove(&self, name: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM options WHERE name = ?1;", [name])?;
        Ok(changed > 0)
    }

    fn list(&self) -> RepoResult<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, value FROM options ORDER BY name ASC;")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
