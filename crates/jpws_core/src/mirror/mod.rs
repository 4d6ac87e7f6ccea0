//! Mirror (backup) files of open databases.
//!
//! # Responsibility
//! - Derive a stable mirror file name from a database path.
//! - Write and remove mirror snapshots in the configured directory.
//!
//! # Invariants
//! - Names depend only on the UTF-8 bytes of the database path.
//! - A failed mirror write leaves any previous mirror file intact.

use crate::repo::snapshot_repo::{load_snapshot_file, save_snapshot_file, DatabaseSnapshot};
use crate::repo::RepoResult;
use log::{info, warn};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

const MIRROR_PREFIX: &str = "jpws-";
const MIRROR_SUFFIX: &str = ".bak";

/// `jpws-<hex of first 8 SHA-256 bytes of the path>.bak`
pub fn mirror_file_name(database_path: &str) -> String {
    let digest = Sha256::digest(database_path.as_bytes());
    format!("{MIRROR_PREFIX}{}{MIRROR_SUFFIX}", hex::encode(&digest[..8]))
}

/// Mirror files of one mirror directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorStore {
    dir: PathBuf,
}

impl MirrorStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mirror_path(&self, database_path: &str) -> PathBuf {
        self.dir.join(mirror_file_name(database_path))
    }

    /// Writes the mirror snapshot of `database_path`.
    pub fn write(&self, database_path: &str, snapshot: &DatabaseSnapshot) -> RepoResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.mirror_path(database_path);
        save_snapshot_file(&path, snapshot)?;
        info!(
            "event=mirror_write module=mirror status=ok file={}",
            mirror_file_name(database_path)
        );
        Ok(path)
    }

    pub fn read(&self, database_path: &str) -> RepoResult<DatabaseSnapshot> {
        load_snapshot_file(&self.mirror_path(database_path))
    }

    pub fn exists(&self, database_path: &str) -> bool {
        self.mirror_path(database_path).is_file()
    }

    /// Deletes the mirror of `database_path`; returns whether one existed.
    pub fn remove(&self, database_path: &str) -> bool {
        let path = self.mirror_path(database_path);
        if !path.exists() {
            return false;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(
                    "event=mirror_remove module=mirror status=ok file={}",
                    mirror_file_name(database_path)
                );
                true
            }
            Err(err) => {
                warn!("event=mirror_remove module=mirror status=error error={err}");
                false
            }
        }
    }
}
