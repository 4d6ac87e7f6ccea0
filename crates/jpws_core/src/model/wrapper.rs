//! Display-oriented record decoration used by the ordered list and views.
//!
//! # Invariants
//! - Wrapper equality and hashing are by record identity only.
//! - The collation key is total: ties on the primary key fall back to UUID.

use crate::model::record::{PwsRecord, RecordId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Column the ordered list is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Title,
    Group,
    Username,
    ModifyTime,
}

/// Expiry classification of a record relative to the expiry scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Valid,
    /// Expires within the configured scope window.
    Expiring,
    Expired,
}

/// Marker for records that arrived through an import operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    #[default]
    Original,
    Imported,
}

/// Total sort key: primary collation string, then record UUID.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollationKey {
    pub primary: String,
    pub secondary: RecordId,
}

impl CollationKey {
    pub fn for_record(record: &PwsRecord, field: SortField) -> Self {
        let primary = match field {
            SortField::Title => record.title.to_lowercase(),
            SortField::Group => format!(
                "{}\u{0}{}",
                record.group_path().to_lowercase(),
                record.title.to_lowercase()
            ),
            SortField::Username => format!(
                "{}\u{0}{}",
                record.username.as_deref().unwrap_or("").to_lowercase(),
                record.title.to_lowercase()
            ),
            SortField::ModifyTime => {
                // Offset into unsigned space so lexicographic order matches numeric order.
                let shifted = (i128::from(record.modify_time) - i128::from(i64::MIN)) as u128;
                format!("{shifted:020}")
            }
        };
        Self {
            primary,
            secondary: record.uuid,
        }
    }
}

/// Effective expiry time: explicit expiry, else last password change plus lifetime.
pub fn effective_expiry(record: &PwsRecord, default_lifetime_days: Option<u32>) -> Option<i64> {
    if record.expiry_time.is_some() {
        return record.expiry_time;
    }
    let lifetime = record.password_lifetime.or(default_lifetime_days)?;
    if lifetime == 0 {
        return None;
    }
    let base = record.pass_mod_time.unwrap_or(record.create_time);
    Some(base.saturating_add(i64::from(lifetime) * MILLIS_PER_DAY))
}

/// Classifies a record against `now_ms` and an expiry scope in days.
pub fn expiry_status(
    record: &PwsRecord,
    now_ms: i64,
    scope_days: u32,
    default_lifetime_days: Option<u32>,
) -> ExpiryStatus {
    match effective_expiry(record, default_lifetime_days) {
        None => ExpiryStatus::Valid,
        Some(expiry) if expiry <= now_ms => ExpiryStatus::Expired,
        Some(expiry) if expiry <= now_ms.saturating_add(i64::from(scope_days) * MILLIS_PER_DAY) => {
            ExpiryStatus::Expiring
        }
        Some(_) => ExpiryStatus::Valid,
    }
}

/// Sortable decoration of one record.
#[derive(Debug, Clone)]
pub struct RecordWrapper {
    record: PwsRecord,
    key: CollationKey,
    expiry: ExpiryStatus,
    import_status: ImportStatus,
}

impl RecordWrapper {
    pub fn new(record: PwsRecord, field: SortField, expiry: ExpiryStatus) -> Self {
        let key = CollationKey::for_record(&record, field);
        Self {
            record,
            key,
            expiry,
            import_status: ImportStatus::Original,
        }
    }

    pub fn with_import_status(mut self, status: ImportStatus) -> Self {
        self.import_status = status;
        self
    }

    pub fn record(&self) -> &PwsRecord {
        &self.record
    }

    pub fn id(&self) -> RecordId {
        self.record.uuid
    }

    pub fn key(&self) -> &CollationKey {
        &self.key
    }

    pub fn expiry(&self) -> ExpiryStatus {
        self.expiry
    }

    pub fn import_status(&self) -> ImportStatus {
        self.import_status
    }

    pub fn into_record(self) -> PwsRecord {
        self.record
    }

    /// Compares by collation key.
    pub fn collate(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl PartialEq for RecordWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.record.uuid == other.record.uuid
    }
}

impl Eq for RecordWrapper {}

impl Hash for RecordWrapper {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.record.uuid.hash(state);
    }
}
