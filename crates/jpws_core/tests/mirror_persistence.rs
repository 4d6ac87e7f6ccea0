use jpws_core::options::{tree_expansion_key, MIRROR_DIR, USE_DATA_MIRRORS};
use jpws_core::repo::snapshot_repo::load_snapshot_file;
use jpws_core::{
    mirror_file_name, AppContext, MemoryOptionsStore, MirrorStore, OptionsStore, Passphrase,
    PwsFileContainer, PwsRecord, SaveDecision, SqliteOptionsStore, ViewMode,
};
use std::path::Path;
use std::sync::Arc;

fn context_with_mirrors(dir: &Path) -> (AppContext, Arc<MemoryOptionsStore>) {
    let options = Arc::new(MemoryOptionsStore::new());
    options
        .set_string(MIRROR_DIR, &dir.to_string_lossy())
        .unwrap();
    (AppContext::new(options.clone()), options)
}

fn assert_counter_invariant(container: &PwsFileContainer) {
    let counters = container.counters();
    assert!(counters.mirror_number <= counters.modify_number);
}

#[test]
fn mirror_is_written_only_for_dirty_content() {
    let mirrors = tempfile::tempdir().unwrap();
    let (context, _) = context_with_mirrors(mirrors.path());
    let mut container = PwsFileContainer::new(context);
    let key = format!("untitled:{}", container.id());
    let store = MirrorStore::new(mirrors.path());

    assert!(!container.check_mirror_activity().unwrap());
    assert!(!store.exists(&key));

    container.add_record(PwsRecord::new("a")).unwrap();
    container.add_record(PwsRecord::new("b")).unwrap();
    assert_eq!(container.modify_number(), 1);
    assert_eq!(container.mirror_number(), 0);
    assert_counter_invariant(&container);

    assert!(container.check_mirror_activity().unwrap());
    assert_eq!(container.mirror_number(), container.modify_number());
    assert!(store.exists(&key));
    assert_eq!(store.read(&key).unwrap().records.len(), 2);

    assert!(!container.check_mirror_activity().unwrap());

    container.add_record(PwsRecord::new("c")).unwrap();
    assert_eq!(container.modify_number(), 2);
    assert_counter_invariant(&container);
    assert!(container.check_mirror_activity().unwrap());
    assert_eq!(store.read(&key).unwrap().records.len(), 3);
}

#[test]
fn mirror_file_name_is_derived_from_database_path() {
    let mirrors = tempfile::tempdir().unwrap();
    let files = tempfile::tempdir().unwrap();
    let path = files.path().join("vault.jpws");
    let (context, _) = context_with_mirrors(mirrors.path());
    let mut container = PwsFileContainer::new(context);
    container.save_as(&path).unwrap();

    container.add_record(PwsRecord::new("a")).unwrap();
    assert!(container.check_mirror_activity().unwrap());

    let expected = mirrors
        .path()
        .join(mirror_file_name(&path.to_string_lossy()));
    assert!(expected.is_file());
    let name = expected.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("jpws-") && name.ends_with(".bak"));
    assert_eq!(name.len(), "jpws-".len() + 16 + ".bak".len());
}

#[test]
fn disabled_mirrors_write_nothing() {
    let mirrors = tempfile::tempdir().unwrap();
    let (context, options) = context_with_mirrors(mirrors.path());
    options.set_bool(USE_DATA_MIRRORS, false).unwrap();
    let mut container = PwsFileContainer::new(context);

    container.add_record(PwsRecord::new("a")).unwrap();
    assert!(!container.check_mirror_activity().unwrap());
    assert!(container.counters().is_dirty());
    assert_eq!(std::fs::read_dir(mirrors.path()).unwrap().count(), 0);
}

#[test]
fn save_syncs_counters_and_removes_mirror() {
    let mirrors = tempfile::tempdir().unwrap();
    let files = tempfile::tempdir().unwrap();
    let path = files.path().join("vault.jpws");
    let (context, _) = context_with_mirrors(mirrors.path());
    let store = MirrorStore::new(mirrors.path());
    let key = path.to_string_lossy().into_owned();

    let mut container = PwsFileContainer::new(context);
    container.save_as(&path).unwrap();
    container.add_record(PwsRecord::new("a")).unwrap();
    container.check_mirror_activity().unwrap();
    assert!(store.exists(&key));

    container.add_record(PwsRecord::new("b")).unwrap();
    assert!(container.counters().is_dirty());
    container.save().unwrap();

    assert!(!store.exists(&key));
    assert!(!container.is_modified());
    assert!(!container.counters().is_dirty());
    assert_eq!(container.database_name(), "vault.jpws");
}

#[test]
fn snapshot_never_carries_the_passphrase() {
    let files = tempfile::tempdir().unwrap();
    let path = files.path().join("vault.jpws");
    let context = AppContext::new(Arc::new(MemoryOptionsStore::new()));
    let mut container = PwsFileContainer::new(context.clone());
    container
        .add_record(PwsRecord::new("bank").with_password("hunter2"))
        .unwrap();
    container.change_passphrase(Passphrase::new("master")).unwrap();
    let crc = container.crc();
    container.save_as(&path).unwrap();

    let snapshot = load_snapshot_file(&path).unwrap();
    assert!(snapshot.header.passphrase.is_empty());
    assert_eq!(snapshot.records.len(), 1);

    let reopened = PwsFileContainer::open(context, &path, Passphrase::new("master")).unwrap();
    assert_eq!(reopened.crc(), crc);
    assert!(!reopened.is_modified());
    assert_eq!(reopened.file_path(), Some(path.as_path()));
}

#[test]
fn recent_lists_survive_save_without_deleted_records() {
    let files = tempfile::tempdir().unwrap();
    let path = files.path().join("vault.jpws");
    let context = AppContext::new(Arc::new(MemoryOptionsStore::new()));
    let mut container = PwsFileContainer::new(context.clone());
    let kept = PwsRecord::new("kept");
    let gone = PwsRecord::new("gone");
    let (kept_id, gone_id) = (kept.uuid, gone.uuid);
    container.add_records(vec![kept, gone]).unwrap();
    container.touch_used(kept_id).unwrap();
    container.toggle_favourite(kept_id).unwrap();
    container.toggle_favourite(gone_id).unwrap();
    container.delete_records(&[gone_id]).unwrap();
    container.save_as(&path).unwrap();

    let reopened = PwsFileContainer::open(context, &path, Passphrase::default()).unwrap();
    let recent = reopened.recent_lists();
    assert!(recent.used.contains(kept_id));
    assert!(recent.favourites.contains(kept_id));
    assert!(!recent.favourites.contains(gone_id));
}

#[test]
fn unclosed_container_is_recovered_from_its_mirror() {
    let mirrors = tempfile::tempdir().unwrap();
    let files = tempfile::tempdir().unwrap();
    let path = files.path().join("vault.jpws");
    let (context, _) = context_with_mirrors(mirrors.path());

    let mut container = PwsFileContainer::new(context.clone());
    container.save_as(&path).unwrap();
    container.add_record(PwsRecord::new("unsaved")).unwrap();
    container.check_mirror_activity().unwrap();
    let crc = container.crc();
    drop(container);

    let store = MirrorStore::new(mirrors.path());
    let recovered =
        PwsFileContainer::recover_mirror(context, &store, &path, Passphrase::default()).unwrap();
    assert_eq!(recovered.crc(), crc);
    assert!(recovered.is_modified());
    assert!(recovered.counters().is_dirty());
    assert_eq!(recovered.file_path(), Some(path.as_path()));
}

#[test]
fn discarding_close_removes_the_mirror() {
    let mirrors = tempfile::tempdir().unwrap();
    let (context, _) = context_with_mirrors(mirrors.path());
    let mut container = PwsFileContainer::new(context);
    let key = format!("untitled:{}", container.id());
    container.add_record(PwsRecord::new("a")).unwrap();
    container.check_mirror_activity().unwrap();
    let store = MirrorStore::new(mirrors.path());
    assert!(store.exists(&key));

    assert!(container
        .close(&mut |_: &str| SaveDecision::Discard)
        .is_closed());
    assert!(!store.exists(&key));
    assert!(!container.check_mirror_activity().unwrap());
}

#[test]
fn saving_close_writes_the_file() {
    let files = tempfile::tempdir().unwrap();
    let path = files.path().join("vault.jpws");
    let context = AppContext::new(Arc::new(MemoryOptionsStore::new()));
    let mut container = PwsFileContainer::new(context.clone());
    container.save_as(&path).unwrap();
    container.add_record(PwsRecord::new("late")).unwrap();

    assert!(container.close(&mut |_: &str| SaveDecision::Save).is_closed());
    let reopened = PwsFileContainer::open(context, &path, Passphrase::default()).unwrap();
    assert_eq!(reopened.record_count(), 1);
}

#[test]
fn tree_expansion_is_kept_in_the_options_store() {
    let files = tempfile::tempdir().unwrap();
    let path = files.path().join("vault.jpws");
    let options = Arc::new(SqliteOptionsStore::open(files.path().join("options.db")).unwrap());
    let context = AppContext::new(options.clone());

    let mut container = PwsFileContainer::new(context.clone());
    container
        .add_record(PwsRecord::new("a").in_group("Mail.Work"))
        .unwrap();
    container.save_as(&path).unwrap();
    container.set_view_mode(ViewMode::Tree).unwrap();
    container.tree_view().borrow_mut().expand("Mail");
    assert!(container
        .close(&mut |_: &str| SaveDecision::Cancel)
        .is_closed());

    let key = tree_expansion_key(&path.to_string_lossy());
    assert_eq!(options.get_string(&key).as_deref(), Some("Mail"));

    let reopened = PwsFileContainer::open(context, &path, Passphrase::default()).unwrap();
    assert!(reopened.tree_view().borrow().is_expanded("Mail"));
    assert!(!reopened.tree_view().borrow().is_expanded("Mail.Work"));
}

#[test]
fn sqlite_options_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("options.db");
    {
        let options = SqliteOptionsStore::open(&path).unwrap();
        options.set_int("maxUndoEntries", 50).unwrap();
        options.set_string("mirrorDir", "/var/mirrors").unwrap();
    }
    let options = SqliteOptionsStore::open(&path).unwrap();
    assert_eq!(options.get_int("maxUndoEntries", 0), 50);
    assert_eq!(
        options.entries().unwrap(),
        vec![
            ("maxUndoEntries".to_string(), "50".to_string()),
            ("mirrorDir".to_string(), "/var/mirrors".to_string()),
        ]
    );
}
