//! Typed view over the options a container reads.

use crate::model::wrapper::SortField;
use crate::options::store::{OptionsError, OptionsResult, OptionsStore};
use std::path::PathBuf;
use std::time::Duration;

pub const MAX_UNDO_ENTRIES: &str = "maxUndoEntries";
pub const USE_DATA_MIRRORS: &str = "useDataMirrors";
pub const VIEW_CURTAIN_TIME: &str = "viewCurtainTime";
pub const STORE_MINOR_CHANGES: &str = "storeMinorChanges";
pub const EXPIRY_SCOPE_DAYS: &str = "expiryScopeDays";
pub const MIRROR_DIR: &str = "mirrorDir";
pub const MIRROR_PERIOD_SECONDS: &str = "mirrorPeriodSeconds";
pub const SORT_FIELD: &str = "sortField";
pub const TREE_EXPANSION_PREFIX: &str = "treeExpansion.";

/// Undo history sizes offered in the preferences.
pub const ALLOWED_UNDO_ENTRIES: [usize; 3] = [10, 25, 50];

const DEFAULT_UNDO_ENTRIES: i64 = 25;
const DEFAULT_EXPIRY_SCOPE_DAYS: i64 = 14;
const DEFAULT_MIRROR_PERIOD_SECONDS: i64 = 60;

/// Maps any configured value to the nearest allowed history size.
pub fn clamp_undo_entries(value: i64) -> usize {
    ALLOWED_UNDO_ENTRIES
        .iter()
        .copied()
        .min_by_key(|allowed| (*allowed as i64 - value).abs())
        .unwrap_or(ALLOWED_UNDO_ENTRIES[1])
}

/// Stores a history size, rejecting sizes the preferences do not offer.
pub fn write_max_undo_entries(store: &dyn OptionsStore, value: usize) -> OptionsResult<()> {
    if !ALLOWED_UNDO_ENTRIES.contains(&value) {
        return Err(OptionsError::InvalidValue {
            name: MAX_UNDO_ENTRIES.to_string(),
            value: value.to_string(),
        });
    }
    store.set_int(MAX_UNDO_ENTRIES, value as i64)
}

/// Options key under which a file's tree expansion state is stored.
pub fn tree_expansion_key(file_fingerprint: &str) -> String {
    format!("{TREE_EXPANSION_PREFIX}{file_fingerprint}")
}

/// Snapshot of the options relevant to one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerOptions {
    pub max_undo_entries: usize,
    pub use_data_mirrors: bool,
    /// Idle time before the view curtain closes; `None` disables it.
    pub view_curtain_time: Option<Duration>,
    pub store_minor_changes: bool,
    pub expiry_scope_days: u32,
    pub mirror_dir: Option<PathBuf>,
    pub mirror_period: Duration,
    pub sort_field: SortField,
}

impl ContainerOptions {
    pub fn read(store: &dyn OptionsStore) -> Self {
        let curtain_seconds = store.get_int(VIEW_CURTAIN_TIME, 0);
        Self {
            max_undo_entries: clamp_undo_entries(
                store.get_int(MAX_UNDO_ENTRIES, DEFAULT_UNDO_ENTRIES),
            ),
            use_data_mirrors: store.get_bool(USE_DATA_MIRRORS, true),
            view_curtain_time: (curtain_seconds > 0)
                .then(|| Duration::from_secs(curtain_seconds as u64)),
            store_minor_changes: store.get_bool(STORE_MINOR_CHANGES, false),
            expiry_scope_days: store
                .get_int(EXPIRY_SCOPE_DAYS, DEFAULT_EXPIRY_SCOPE_DAYS)
                .clamp(0, i64::from(u32::MAX)) as u32,
            mirror_dir: store
                .get_string(MIRROR_DIR)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
            mirror_period: Duration::from_secs(
                store
                    .get_int(MIRROR_PERIOD_SECONDS, DEFAULT_MIRROR_PERIOD_SECONDS)
                    .max(1) as u64,
            ),
            sort_field: parse_sort_field(store.get_string(SORT_FIELD).as_deref()),
        }
    }
}

fn parse_sort_field(value: Option<&str>) -> SortField {
    match value.map(str::trim) {
        Some("group") => SortField::Group,
        Some("username") => SortField::Username,
        Some("modify_time") => SortField::ModifyTime,
        _ => SortField::Title,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        clamp_undo_entries, write_max_undo_entries, ContainerOptions, MAX_UNDO_ENTRIES,
        VIEW_CURTAIN_TIME,
    };
    use crate::options::OptionsStore;
    use crate::model::wrapper::SortField;
    use crate::options::MemoryOptionsStore;
    use std::time::Duration;

    #[test]
    fn undo_entries_clamp_to_allowed_sizes() {
        assert_eq!(clamp_undo_entries(10), 10);
        assert_eq!(clamp_undo_entries(1), 10);
        assert_eq!(clamp_undo_entries(30), 25);
        assert_eq!(clamp_undo_entries(1000), 50);
    }

    #[test]
    fn write_max_undo_entries_rejects_unoffered_sizes() {
        let store = MemoryOptionsStore::new();
        assert!(write_max_undo_entries(&store, 30).is_err());
        write_max_undo_entries(&store, 10).unwrap();
        assert_eq!(store.get_int(MAX_UNDO_ENTRIES, 0), 10);
    }

    #[test]
    fn defaults_apply_for_empty_store() {
        let options = ContainerOptions::read(&MemoryOptionsStore::new());
        assert_eq!(options.max_undo_entries, 25);
        assert!(options.use_data_mirrors);
        assert_eq!(options.view_curtain_time, None);
        assert!(!options.store_minor_changes);
        assert_eq!(options.sort_field, SortField::Title);
    }

    #[test]
    fn configured_values_are_read() {
        let store = MemoryOptionsStore::with_values([
            (MAX_UNDO_ENTRIES, "50"),
            (VIEW_CURTAIN_TIME, "120"),
            ("sortField", "group"),
            ("mirrorDir", "/tmp/mirrors"),
        ]);
        let options = ContainerOptions::read(&store);
        assert_eq!(options.max_undo_entries, 50);
        assert_eq!(options.view_curtain_time, Some(Duration::from_secs(120)));
        assert_eq!(options.sort_field, SortField::Group);
        assert_eq!(
            options.mirror_dir.as_deref(),
            Some(std::path::Path::new("/tmp/mirrors"))
        );
    }
}
