//! Password record domain model.
//!
//! # Responsibility
//! - Define the canonical record shape held by the in-memory record list.
//! - Provide validation, group-path helpers and a stable content signature.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another record.
//! - `title` is never blank after validation.
//! - Group paths are dot separated and contain no empty segments.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one password record.
pub type RecordId = Uuid;

/// Separator between segments of a group path (`Mail.Work`).
pub const GROUP_SEPARATOR: char = '.';

/// Validation errors for [`PwsRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    BlankTitle(RecordId),
    EmptyGroupSegment { id: RecordId, group: String },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle(id) => write!(f, "record {id} has a blank title"),
            Self::EmptyGroupSegment { id, group } => {
                write!(f, "record {id} has an empty segment in group `{group}`")
            }
        }
    }
}

impl Error for RecordValidationError {}

/// One entry of a password database.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PwsRecord {
    pub uuid: RecordId,
    /// Dot separated group path. `None` means top level.
    pub group: Option<String>,
    pub title: String,
    pub username: Option<String>,
    pub password: String,
    pub notes: Option<String>,
    pub url: Option<String>,
    /// Epoch ms after which the password counts as expired.
    pub expiry_time: Option<i64>,
    /// Password lifetime in days, overrides the file default when set.
    pub password_lifetime: Option<u32>,
    pub create_time: i64,
    pub modify_time: i64,
    pub access_time: Option<i64>,
    pub pass_mod_time: Option<i64>,
}

impl Debug for PwsRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PwsRecord")
            .field("uuid", &self.uuid)
            .field("group", &self.group)
            .field("title", &self.title)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("expiry_time", &self.expiry_time)
            .field("modify_time", &self.modify_time)
            .finish_non_exhaustive()
    }
}

impl PwsRecord {
    /// Creates a record with a generated stable ID.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title)
    }

    /// Creates a record with a caller-provided ID.
    ///
    /// Used by snapshot loading and tests where identity already exists.
    pub fn with_id(uuid: RecordId, title: impl Into<String>) -> Self {
        Self {
            uuid,
            group: None,
            title: title.into(),
            username: None,
            password: String::new(),
            notes: None,
            url: None,
            expiry_time: None,
            password_lifetime: None,
            create_time: 0,
            modify_time: 0,
            access_time: None,
            pass_mod_time: None,
        }
    }

    /// Builder helper: sets the group path.
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        let group = group.into();
        self.group = if group.is_empty() { None } else { Some(group) };
        self
    }

    /// Builder helper: sets the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Validates title and group path shape.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.title.trim().is_empty() {
            return Err(RecordValidationError::BlankTitle(self.uuid));
        }
        if let Some(group) = self.group.as_deref() {
            if group.split(GROUP_SEPARATOR).any(|segment| segment.is_empty()) {
                return Err(RecordValidationError::EmptyGroupSegment {
                    id: self.uuid,
                    group: group.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Group path or empty string for top-level records.
    pub fn group_path(&self) -> &str {
        self.group.as_deref().unwrap_or("")
    }

    /// Whether this record lives in `group` or any of its subgroups.
    pub fn is_in_group(&self, group: &str) -> bool {
        is_group_or_descendant(self.group_path(), group)
    }

    /// Whether the password has passed its expiry time at `now_ms`.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expiry_time.is_some_and(|expiry| expiry <= now_ms)
    }

    /// Hex encoded SHA-256 over the canonical field encoding.
    pub fn signature(&self) -> String {
        hex::encode(Sha256::digest(self.canonical_bytes()))
    }

    /// Length-prefixed field encoding used for signatures and list CRCs.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128);
        out.extend_from_slice(self.uuid.as_bytes());
        push_opt_str(&mut out, self.group.as_deref());
        push_str(&mut out, &self.title);
        push_opt_str(&mut out, self.username.as_deref());
        push_str(&mut out, &self.password);
        push_opt_str(&mut out, self.notes.as_deref());
        push_opt_str(&mut out, self.url.as_deref());
        push_opt_i64(&mut out, self.expiry_time);
        push_opt_i64(&mut out, self.password_lifetime.map(i64::from));
        out.extend_from_slice(&self.create_time.to_be_bytes());
        out.extend_from_slice(&self.modify_time.to_be_bytes());
        push_opt_i64(&mut out, self.access_time);
        push_opt_i64(&mut out, self.pass_mod_time);
        out
    }
}

/// Whether `path` equals `group` or is nested below it.
///
/// An empty `group` matches every path.
pub fn is_group_or_descendant(path: &str, group: &str) -> bool {
    if group.is_empty() || path == group {
        return true;
    }
    path.len() > group.len()
        && path.starts_with(group)
        && path[group.len()..].starts_with(GROUP_SEPARATOR)
}

/// Re-roots `path` from `old_prefix` to `new_prefix`.
///
/// Returns `None` when `path` is not inside `old_prefix`.
pub fn rebase_group(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if !is_group_or_descendant(path, old_prefix) || old_prefix.is_empty() {
        return None;
    }
    let rest = &path[old_prefix.len()..];
    Some(format!("{new_prefix}{rest}"))
}

fn push_str(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(&(value.len() as u64).to_be_bytes());
    out.extend_from_slice(value.as_bytes());
}

fn push_opt_str(out: &mut Vec<u8>, value: Option<&str>) {
    match value {
        Some(value) => {
            out.push(1);
            push_str(out, value);
        }
        None => out.push(0),
    }
}

fn push_opt_i64(out: &mut Vec<u8>, value: Option<i64>) {
    match value {
        Some(value) => {
            out.push(1);
            out.extend_from_slice(&value.to_be_bytes());
        }
        None => out.push(0),
    }
}

#[cfg(test)]
mod tests {
    use super::{is_group_or_descendant, rebase_group, PwsRecord, RecordValidationError};

    #[test]
    fn validate_rejects_blank_title_and_empty_group_segment() {
        let blank = PwsRecord::new("  ");
        assert!(matches!(
            blank.validate(),
            Err(RecordValidationError::BlankTitle(_))
        ));

        let bad_group = PwsRecord::new("Mail").in_group("Work..Inbox");
        assert!(matches!(
            bad_group.validate(),
            Err(RecordValidationError::EmptyGroupSegment { .. })
        ));
    }

    #[test]
    fn group_descendant_matching_respects_segment_boundaries() {
        assert!(is_group_or_descendant("Mail.Work", "Mail"));
        assert!(is_group_or_descendant("Mail", "Mail"));
        assert!(!is_group_or_descendant("Mailbox", "Mail"));
        assert!(is_group_or_descendant("anything", ""));
    }

    #[test]
    fn rebase_group_moves_subtree() {
        assert_eq!(
            rebase_group("Mail.Work.Old", "Mail.Work", "Archive").as_deref(),
            Some("Archive.Old")
        );
        assert_eq!(rebase_group("Bank", "Mail", "Archive"), None);
    }

    #[test]
    fn signature_changes_with_password() {
        let record = PwsRecord::new("Bank").with_password("one");
        let mut changed = record.clone();
        changed.password = "two".to_string();
        assert_ne!(record.signature(), changed.signature());
        assert_eq!(record.signature(), record.clone().signature());
    }

    #[test]
    fn debug_output_hides_password() {
        let record = PwsRecord::new("Bank").with_password("hunter2");
        assert!(!format!("{record:?}").contains("hunter2"));
    }
}
