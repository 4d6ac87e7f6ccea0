//! Record list holding the records and header of one database.

use crate::model::header::{FileHeader, HeaderFieldValue, Passphrase};
use crate::model::record::{PwsRecord, RecordId, RecordValidationError};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type StoreResult<T> = Result<T, StoreError>;

/// Record store errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    DuplicateEntry(RecordId),
    NoSuchRecord(RecordId),
    Validation(RecordValidationError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEntry(id) => write!(f, "duplicate record: {id}"),
            Self::NoSuchRecord(id) => write!(f, "no such record: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::DuplicateEntry(_) | Self::NoSuchRecord(_) => None,
        }
    }
}

impl From<RecordValidationError> for StoreError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Records and header of one database, keyed by record ID.
#[derive(Debug, Clone, Default)]
pub struct RecordList {
    records: BTreeMap<RecordId, PwsRecord>,
    header: FileHeader,
    file_path: Option<PathBuf>,
    modified: bool,
}

impl RecordList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from persisted content; the result is unmodified.
    pub fn from_parts(
        header: FileHeader,
        records: impl IntoIterator<Item = PwsRecord>,
    ) -> StoreResult<Self> {
        let mut list = Self {
            header,
            ..Self::default()
        };
        for record in records {
            list.add_record(record)?;
        }
        list.modified = false;
        Ok(list)
    }

    pub fn add_record(&mut self, record: PwsRecord) -> StoreResult<()> {
        record.validate()?;
        if self.records.contains_key(&record.uuid) {
            return Err(StoreError::DuplicateEntry(record.uuid));
        }
        self.records.insert(record.uuid, record);
        self.modified = true;
        Ok(())
    }

    /// Replaces a record by ID and returns the previous version.
    pub fn update_record(&mut self, record: PwsRecord) -> StoreResult<PwsRecord> {
        record.validate()?;
        let Some(slot) = self.records.get_mut(&record.uuid) else {
            return Err(StoreError::NoSuchRecord(record.uuid));
        };
        let previous = std::mem::replace(slot, record);
        self.modified = true;
        Ok(previous)
    }

    pub fn delete_record(&mut self, id: RecordId) -> StoreResult<PwsRecord> {
        let removed = self
            .records
            .remove(&id)
            .ok_or(StoreError::NoSuchRecord(id))?;
        self.modified = true;
        Ok(removed)
    }

    pub fn get(&self, id: RecordId) -> Option<&PwsRecord> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.records.contains_key(&id)
    }

    /// Iterates records in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &PwsRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Writes one header field and returns its previous value.
    pub fn replace_header_field(&mut self, value: HeaderFieldValue) -> HeaderFieldValue {
        self.modified = true;
        self.header.replace(value)
    }

    pub fn replace_passphrase(&mut self, passphrase: Passphrase) -> Passphrase {
        self.modified = true;
        std::mem::replace(&mut self.header.passphrase, passphrase)
    }

    /// Swaps the whole content, returning the previous header and records.
    pub fn replace_content(
        &mut self,
        header: FileHeader,
        records: Vec<PwsRecord>,
    ) -> (FileHeader, Vec<PwsRecord>) {
        let previous_header = std::mem::replace(&mut self.header, header);
        let previous_records = std::mem::take(&mut self.records).into_values().collect();
        self.records = records
            .into_iter()
            .map(|record| (record.uuid, record))
            .collect();
        self.modified = true;
        (previous_header, previous_records)
    }

    /// Four-byte checksum over header and records in ID order.
    pub fn crc(&self) -> u32 {
        let mut hasher = Sha256::new();
        hasher.update(self.header.description.as_deref().unwrap_or("").as_bytes());
        hasher.update([0]);
        hasher.update(
            self.header
                .password_lifetime
                .map_or(-1, i64::from)
                .to_be_bytes(),
        );
        hasher.update(self.header.password_policy.as_deref().unwrap_or("").as_bytes());
        hasher.update([0]);
        hasher.update(self.header.passphrase.expose().as_bytes());
        hasher.update([0]);
        for record in self.records.values() {
            hasher.update(record.canonical_bytes());
        }
        let digest = hasher.finalize();
        u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn set_file_path(&mut self, path: Option<PathBuf>) {
        self.file_path = path;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn reset_modified(&mut self) {
        self.modified = false;
    }

    /// Flags content that differs from the file, e.g. after mirror recovery.
    pub fn mark_modified(&mut self) {
        self.modified = true;
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordList, StoreError};
    use crate::model::header::HeaderFieldValue;
    use crate::model::record::PwsRecord;

    #[test]
    fn add_rejects_duplicates_and_marks_modified() {
        let mut list = RecordList::new();
        let record = PwsRecord::new("Bank");
        list.add_record(record.clone()).unwrap();
        assert!(list.is_modified());

        let err = list.add_record(record.clone()).unwrap_err();
        assert_eq!(err, StoreError::DuplicateEntry(record.uuid));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn update_and_delete_missing_record_fail() {
        let mut list = RecordList::new();
        let record = PwsRecord::new("Ghost");
        assert_eq!(
            list.update_record(record.clone()).unwrap_err(),
            StoreError::NoSuchRecord(record.uuid)
        );
        assert_eq!(
            list.delete_record(record.uuid).unwrap_err(),
            StoreError::NoSuchRecord(record.uuid)
        );
    }

    #[test]
    fn crc_tracks_records_and_header() {
        let mut list = RecordList::new();
        let empty = list.crc();
        let record = PwsRecord::new("Bank");
        list.add_record(record.clone()).unwrap();
        let with_record = list.crc();
        assert_ne!(empty, with_record);

        list.replace_header_field(HeaderFieldValue::PasswordPolicy(Some("L12".into())));
        assert_ne!(with_record, list.crc());

        list.replace_header_field(HeaderFieldValue::PasswordPolicy(None));
        assert_eq!(with_record, list.crc());

        list.delete_record(record.uuid).unwrap();
        assert_eq!(empty, list.crc());
    }

    #[test]
    fn from_parts_starts_unmodified() {
        let list = RecordList::from_parts(Default::default(), vec![PwsRecord::new("A")]).unwrap();
        assert!(!list.is_modified());
        assert_eq!(list.len(), 1);
    }
}
