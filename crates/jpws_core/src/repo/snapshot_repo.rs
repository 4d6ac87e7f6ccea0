//! Snapshot repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the full record set, header fields and recency lists of one
//!   database as a self-contained SQLite file.
//! - Serve both explicit saves and mirror backups.
//!
//! # Invariants
//! - The passphrase is never written; readers supply it after loading.
//! - File writes go to a sibling temp file that is renamed into place, so a
//!   failed write leaves the previous file intact.

use crate::db::open_db;
use crate::model::header::FileHeader;
use crate::model::record::PwsRecord;
use crate::repo::{RepoError, RepoResult};
use log::{error, info};
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

const META_DESCRIPTION: &str = "description";
const META_PASSWORD_LIFETIME: &str = "password_lifetime";
const META_PASSWORD_POLICY: &str = "password_policy";
const META_RECENT_USED: &str = "recent_used";
const META_RECENT_EDITED: &str = "recent_edited";
const META_FAVOURITES: &str = "favourites";
const META_SOURCE_PATH: &str = "source_path";
const META_WRITTEN_AT: &str = "written_at_ms";

const RECORD_SELECT_SQL: &str = "SELECT
    uuid,
    group_path,
    title,
    username,
    password,
    notes,
    url,
    expiry_time,
    password_lifetime,
    create_time,
    modify_time,
    access_time,
    pass_mod_time
FROM records
ORDER BY uuid ASC";

/// Persisted form of the recency lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentSnapshot {
    pub used: String,
    pub edited: String,
    pub favourites: String,
}

/// Full content of one database at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseSnapshot {
    /// Header without passphrase.
    pub header: FileHeader,
    pub records: Vec<PwsRecord>,
    pub recent: RecentSnapshot,
    /// Path of the database this snapshot was taken from.
    pub source_path: Option<String>,
    pub written_at_ms: i64,
}

/// Repository interface for snapshot persistence.
pub trait SnapshotRepository {
    fn write_snapshot(&self, snapshot: &DatabaseSnapshot) -> RepoResult<()>;
    fn read_snapshot(&self) -> RepoResult<DatabaseSnapshot>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn write_snapshot(&self, snapshot: &DatabaseSnapshot) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM records;", [])?;
        tx.execute("DELETE FROM snapshot_meta;", [])?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO records (
                    uuid,
                    group_path,
                    title,
                    username,
                    password,
                    notes,
                    url,
                    expiry_time,
                    password_lifetime,
                    create_time,
                    modify_time,
                    access_time,
                    pass_mod_time
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            )?;
            for record in &snapshot.records {
                insert.execute(params![
                    record.uuid.to_string(),
                    record.group.as_deref(),
                    record.title.as_str(),
                    record.username.as_deref(),
                    record.password.as_str(),
                    record.notes.as_deref(),
                    record.url.as_deref(),
                    record.expiry_time,
                    record.password_lifetime,
                    record.create_time,
                    record.modify_time,
                    record.access_time,
                    record.pass_mod_time,
                ])?;
            }

            let mut meta =
                tx.prepare("INSERT INTO snapshot_meta (key, value) VALUES (?1, ?2);")?;
            let header = &snapshot.header;
            let mut entries: Vec<(&str, String)> = vec![
                (META_RECENT_USED, snapshot.recent.used.clone()),
                (META_RECENT_EDITED, snapshot.recent.edited.clone()),
                (META_FAVOURITES, snapshot.recent.favourites.clone()),
                (META_WRITTEN_AT, snapshot.written_at_ms.to_string()),
            ];
            if let Some(value) = header.description.as_ref() {
                entries.push((META_DESCRIPTION, value.clone()));
            }
            if let Some(value) = header.password_lifetime {
                entries.push((META_PASSWORD_LIFETIME, value.to_string()));
            }
            if let Some(value) = header.password_policy.as_ref() {
                entries.push((META_PASSWORD_POLICY, value.clone()));
            }
            if let Some(value) = snapshot.source_path.as_ref() {
                entries.push((META_SOURCE_PATH, value.clone()));
            }
            for (key, value) in entries {
                meta.execute(params![key, value])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn read_snapshot(&self) -> RepoResult<DatabaseSnapshot> {
        let mut stmt = self.conn.prepare(RECORD_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        let mut meta_stmt = self.conn.prepare("SELECT key, value FROM snapshot_meta;")?;
        let meta: HashMap<String, String> = meta_stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?;

        let password_lifetime = match meta.get(META_PASSWORD_LIFETIME) {
            Some(value) => Some(value.parse::<u32>().map_err(|_| {
                RepoError::InvalidData(format!("invalid password lifetime `{value}`"))
            })?),
            None => None,
        };
        let written_at_ms = match meta.get(META_WRITTEN_AT) {
            Some(value) => value.parse::<i64>().map_err(|_| {
                RepoError::InvalidData(format!("invalid snapshot timestamp `{value}`"))
            })?,
            None => 0,
        };

        Ok(DatabaseSnapshot {
            header: FileHeader {
                description: meta.get(META_DESCRIPTION).cloned(),
                password_lifetime,
                password_policy: meta.get(META_PASSWORD_POLICY).cloned(),
                passphrase: Default::default(),
            },
            records,
            recent: RecentSnapshot {
                used: meta.get(META_RECENT_USED).cloned().unwrap_or_default(),
                edited: meta.get(META_RECENT_EDITED).cloned().unwrap_or_default(),
                favourites: meta.get(META_FAVOURITES).cloned().unwrap_or_default(),
            },
            source_path: meta.get(META_SOURCE_PATH).cloned(),
            written_at_ms,
        })
    }
}

/// Writes `snapshot` to `path` through a temp file and rename.
///
/// # Side effects
/// - Emits `snapshot_write` logging events with duration and status.
pub fn save_snapshot_file(path: &Path, snapshot: &DatabaseSnapshot) -> RepoResult<()> {
    let started_at = Instant::now();
    let temp_path = temp_path_for(path);
    let result = write_via_temp(path, &temp_path, snapshot);
    match &result {
        Ok(()) => info!(
            "event=snapshot_write module=repo status=ok records={} duration_ms={}",
            snapshot.records.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => {
            let _ = std::fs::remove_file(&temp_path);
            error!(
                "event=snapshot_write module=repo status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
        }
    }
    result
}

/// Reads a snapshot file written by [`save_snapshot_file`].
pub fn load_snapshot_file(path: &Path) -> RepoResult<DatabaseSnapshot> {
    if !path.is_file() {
        return Err(RepoError::InvalidData(format!(
            "snapshot file not found: {}",
            path.display()
        )));
    }
    let conn = open_db(path)?;
    let snapshot = SqliteSnapshotRepository::new(&conn).read_snapshot()?;
    info!(
        "event=snapshot_read module=repo status=ok records={}",
        snapshot.records.len()
    );
    Ok(snapshot)
}

fn write_via_temp(path: &Path, temp_path: &Path, snapshot: &DatabaseSnapshot) -> RepoResult<()> {
    if temp_path.exists() {
        std::fs::remove_file(temp_path)?;
    }
    {
        let conn = open_db(temp_path)?;
        SqliteSnapshotRepository::new(&conn).write_snapshot(snapshot)?;
    }
    std::fs::rename(temp_path, path)?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<PwsRecord> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in records.uuid"))
    })?;

    let record = PwsRecord {
        uuid,
        group: row.get("group_path")?,
        title: row.get("title")?,
        username: row.get("username")?,
        password: row.get("password")?,
        notes: row.get("notes")?,
        url: row.get("url")?,
        expiry_time: row.get("expiry_time")?,
        password_lifetime: row.get("password_lifetime")?,
        create_time: row.get("create_time")?,
        modify_time: row.get("modify_time")?,
        access_time: row.get("access_time")?,
        pass_mod_time: row.get("pass_mod_time")?,
    };
    record
        .validate()
        .map_err(|err| RepoError::InvalidData(err.to_string()))?;
    Ok(record)
}
