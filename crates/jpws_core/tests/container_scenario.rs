use jpws_core::container::{FilterStatus, PropertyKind};
use jpws_core::list::{OrderedListEventKind, SharedListener};
use jpws_core::model::wrapper::ExpiryStatus;
use jpws_core::options::VIEW_CURTAIN_TIME;
use jpws_core::{
    AppContext, CloseOutcome, ContainerChangeListener, ContainerError, ContainerProperty,
    FilterMode, ManualClock, MemoryOptionsStore, OperationMode, OrderedListEvent,
    OrderedListListener, Passphrase, PwsFileContainer, PwsRecord, SaveDecision, SelectionStatus,
    ViewMode,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

fn container() -> PwsFileContainer {
    PwsFileContainer::new(AppContext::new(Arc::new(MemoryOptionsStore::new())))
}

#[derive(Default)]
struct ListLog {
    kinds: Vec<OrderedListEventKind>,
}

impl OrderedListListener for ListLog {
    fn ordered_list_performed(&mut self, event: &OrderedListEvent) {
        self.kinds.push(event.kind());
    }
}

#[derive(Default)]
struct PropertyLog {
    seen: Vec<ContainerProperty>,
}

impl PropertyLog {
    fn count(&self, kind: PropertyKind) -> usize {
        self.seen.iter().filter(|property| property.kind() == kind).count()
    }
}

impl ContainerChangeListener for PropertyLog {
    fn container_changed(&mut self, property: &ContainerProperty) {
        self.seen.push(property.clone());
    }
}

struct Panicker;

impl ContainerChangeListener for Panicker {
    fn container_changed(&mut self, _property: &ContainerProperty) {
        panic!("listener failure");
    }
}

#[test]
fn add_undo_redo_drive_list_events_and_counters() {
    let mut container = container();
    let log = Rc::new(RefCell::new(ListLog::default()));
    let listener: SharedListener = log.clone();
    container.add_list_listener(listener);

    let record = PwsRecord::new("R1");
    container.add_record(record.clone()).unwrap();
    let after_add = container.crc();
    assert_eq!(container.ordered_list().len(), 1);
    assert_eq!(log.borrow().kinds, vec![OrderedListEventKind::ItemAdded]);
    assert_eq!(container.modify_number(), 1);
    assert!(container.is_modified());

    container.undo().unwrap();
    assert_eq!(container.ordered_list().len(), 0);
    assert_eq!(
        log.borrow().kinds.last(),
        Some(&OrderedListEventKind::ItemRemoved)
    );
    assert_eq!(container.modify_number(), 1);

    container.redo().unwrap();
    assert_eq!(container.modify_number(), 1);
    assert_eq!(container.crc(), after_add);
    assert_eq!(container.record(record.uuid), Some(&record));
    assert_eq!(container.table_view().borrow().row_count(), 1);
}

#[test]
fn favourites_filter_hides_and_restores_records() {
    let mut container = container();
    let a = PwsRecord::new("alpha");
    let a_id = a.uuid;
    container
        .add_records(vec![a, PwsRecord::new("beta")])
        .unwrap();

    container.set_filter_mode(FilterMode::Favourites).unwrap();
    assert_eq!(container.ordered_list().len(), 0);
    assert_eq!(container.record_count(), 2);

    assert!(container.toggle_favourite(a_id).unwrap());
    assert_eq!(container.ordered_list().len(), 1);
    assert_eq!(container.table_view().borrow().row_count(), 1);

    container.set_filter_mode(FilterMode::All).unwrap();
    assert_eq!(container.ordered_list().len(), 2);
    assert_eq!(
        container.filter_status(),
        FilterStatus {
            mode: FilterMode::All,
            find_text: None,
        }
    );
}

#[test]
fn quick_find_matches_any_text_field_case_insensitively() {
    let mut container = container();
    let mut bank = PwsRecord::new("bank");
    bank.username = Some("MailOrder".to_string());
    container
        .add_records(vec![PwsRecord::new("Mail"), bank, PwsRecord::new("shop")])
        .unwrap();

    container.quick_find(Some("  mail ")).unwrap();
    assert_eq!(container.ordered_list().len(), 2);
    assert_eq!(container.filter_status().find_text.as_deref(), Some("mail"));

    container.quick_find(Some("")).unwrap();
    assert_eq!(container.ordered_list().len(), 3);
    assert_eq!(container.filter_status().find_text, None);
}

#[test]
fn expiry_filters_follow_the_clock() {
    let clock = Arc::new(ManualClock::new(100 * DAY_MS));
    let context = AppContext::new(Arc::new(MemoryOptionsStore::new())).with_clock(clock.clone());
    let mut container = PwsFileContainer::new(context);

    let mut expired = PwsRecord::new("expired");
    expired.expiry_time = Some(99 * DAY_MS);
    let mut soon = PwsRecord::new("soon");
    soon.expiry_time = Some(105 * DAY_MS);
    let mut later = PwsRecord::new("later");
    later.expiry_time = Some(200 * DAY_MS);
    container.add_records(vec![expired, soon, later]).unwrap();

    container.set_filter_mode(FilterMode::Expired).unwrap();
    assert_eq!(container.ordered_list().len(), 1);
    container.set_filter_mode(FilterMode::Expiring).unwrap();
    assert_eq!(container.ordered_list().len(), 2);

    clock.set(300 * DAY_MS);
    container.refresh_expiry();
    assert_eq!(container.ordered_list().len(), 3);
}

#[test]
fn records_added_after_the_clock_moves_are_classified_against_it() {
    let clock = Arc::new(ManualClock::new(100 * DAY_MS));
    let context = AppContext::new(Arc::new(MemoryOptionsStore::new())).with_clock(clock.clone());
    let mut container = PwsFileContainer::new(context);
    container.set_filter_mode(FilterMode::Expired).unwrap();
    assert_eq!(container.ordered_list().len(), 0);

    clock.set(300 * DAY_MS);
    let mut lapsed = PwsRecord::new("lapsed");
    lapsed.expiry_time = Some(200 * DAY_MS);
    let lapsed_id = lapsed.uuid;
    container.add_record(lapsed).unwrap();
    assert_eq!(container.ordered_list().len(), 1);
    assert_eq!(
        container.ordered_list().get(0).unwrap().expiry(),
        ExpiryStatus::Expired
    );

    clock.set(400 * DAY_MS);
    let mut edited = container.record(lapsed_id).unwrap().clone();
    edited.expiry_time = Some(350 * DAY_MS);
    container.update_record(edited).unwrap();
    assert_eq!(container.ordered_list().len(), 1);
    assert_eq!(container.ordered_list().get(0).unwrap().id(), lapsed_id);
}

#[test]
fn level_properties_are_deduplicated_and_events_are_not() {
    let mut container = container();
    container
        .add_records(vec![PwsRecord::new("a"), PwsRecord::new("b")])
        .unwrap();
    let log = Rc::new(RefCell::new(PropertyLog::default()));
    container.add_change_listener(log.clone());

    container.select_indices(&[0]);
    container.select_indices(&[0]);
    container.set_view_mode(ViewMode::Tree).unwrap();
    container.set_view_mode(ViewMode::Tree).unwrap();
    container.add_record(PwsRecord::new("c")).unwrap();
    container.add_record(PwsRecord::new("d")).unwrap();

    let log = log.borrow();
    assert_eq!(log.count(PropertyKind::SelectionEvent), 2);
    assert_eq!(log.count(PropertyKind::SelectionStatus), 1);
    assert_eq!(log.count(PropertyKind::DisplayMode), 1);
    assert_eq!(log.count(PropertyKind::ModifyEvent), 2);
    assert!(log
        .seen
        .contains(&ContainerProperty::SelectionStatus(SelectionStatus::RecordSelected)));
}

#[test]
fn view_switch_carries_selection_over() {
    let mut container = container();
    let a = PwsRecord::new("a").in_group("G");
    let b = PwsRecord::new("b");
    let b_id = b.uuid;
    container.add_records(vec![a, b]).unwrap();

    container.select_records(&[b_id]);
    container.set_view_mode(ViewMode::Tree).unwrap();
    assert_eq!(container.selected_ids(), vec![b_id]);
    assert_eq!(container.selection_status(), SelectionStatus::RecordSelected);

    assert!(container.select_group("G"));
    assert_eq!(container.selection_status(), SelectionStatus::GroupSelected);
    assert!(container.selected_ids().is_empty());

    container.set_view_mode(ViewMode::Table).unwrap();
    assert!(!container.select_group("G"));
}

#[test]
fn undoing_a_delete_leaves_the_current_selection_alone() {
    let mut container = container();
    let a = PwsRecord::new("a");
    let b = PwsRecord::new("b");
    let (a_id, b_id) = (a.uuid, b.uuid);
    container.add_records(vec![a, b]).unwrap();

    container.select_records(&[a_id]);
    container.delete_records(&[a_id]).unwrap();
    container.select_records(&[b_id]);
    container.undo().unwrap();

    assert_eq!(container.record_count(), 2);
    assert_eq!(container.selected_ids(), vec![b_id]);
}

#[test]
fn panicking_listener_does_not_block_others() {
    let mut container = container();
    container.add_change_listener(Rc::new(RefCell::new(Panicker)));
    let log = Rc::new(RefCell::new(PropertyLog::default()));
    container.add_change_listener(log.clone());

    container.add_record(PwsRecord::new("a")).unwrap();
    assert_eq!(log.borrow().count(PropertyKind::ModifyEvent), 1);
}

#[test]
fn mount_reports_operation_mode() {
    let mut container = container();
    assert_eq!(container.operation_mode(), OperationMode::Virgin);
    let log = Rc::new(RefCell::new(PropertyLog::default()));
    container.add_change_listener(log.clone());

    container.mount(true).unwrap();
    container.mount(true).unwrap();
    container.mount(false).unwrap();
    assert_eq!(container.operation_mode(), OperationMode::MountedPassive);
    assert_eq!(
        log.borrow().seen,
        vec![
            ContainerProperty::OperationMode(OperationMode::MountedActive),
            ContainerProperty::OperationMode(OperationMode::MountedPassive),
        ]
    );
}

#[test]
fn close_is_refused_while_io_is_in_progress() {
    let mut container = container();
    container.add_record(PwsRecord::new("a")).unwrap();
    let tracker = container.io_tracker();

    let guard = tracker.begin();
    let mut asked = false;
    let outcome = container.close(&mut |_: &str| {
        asked = true;
        SaveDecision::Discard
    });
    assert!(matches!(outcome, CloseOutcome::Busy));
    assert!(!asked);
    assert_eq!(container.record_count(), 1);

    drop(guard);
    assert!(container
        .close(&mut |_: &str| SaveDecision::Discard)
        .is_closed());
}

#[test]
fn cancelled_close_keeps_everything() {
    let mut container = container();
    container.mount(true).unwrap();
    container.add_record(PwsRecord::new("a")).unwrap();

    let mut asked_for = None;
    let outcome = container.close(&mut |name: &str| {
        asked_for = Some(name.to_string());
        SaveDecision::Cancel
    });
    assert!(matches!(outcome, CloseOutcome::Cancelled));
    assert_eq!(asked_for.as_deref(), Some("untitled"));
    assert_eq!(container.operation_mode(), OperationMode::MountedActive);
    assert_eq!(container.record_count(), 1);
    assert!(container.can_undo());
}

#[test]
fn failed_save_aborts_close() {
    let mut container = container();
    container.add_record(PwsRecord::new("a")).unwrap();

    let outcome = container.close(&mut |_: &str| SaveDecision::Save);
    assert!(matches!(
        outcome,
        CloseOutcome::Failed(ContainerError::NoFilePath)
    ));
    assert_ne!(container.operation_mode(), OperationMode::Unmounted);
    assert_eq!(container.record_count(), 1);
}

#[test]
fn discarded_close_tears_down_and_rejects_further_work() {
    let mut container = container();
    container.mount(true).unwrap();
    container.add_record(PwsRecord::new("a")).unwrap();
    let log = Rc::new(RefCell::new(PropertyLog::default()));
    container.add_change_listener(log.clone());

    let outcome = container.close(&mut |_: &str| SaveDecision::Discard);
    assert!(outcome.is_closed());
    assert_eq!(container.operation_mode(), OperationMode::Unmounted);
    assert_eq!(
        log.borrow().seen.last(),
        Some(&ContainerProperty::OperationMode(OperationMode::Unmounted))
    );
    assert_eq!(container.record_count(), 0);
    assert!(container.ordered_list().is_empty());
    assert_eq!(container.ordered_list().listener_count(), 0);
    assert!(!container.can_undo());
    assert_eq!(container.selection_status(), SelectionStatus::NothingSelected);

    assert!(matches!(
        container.add_record(PwsRecord::new("b")),
        Err(ContainerError::Unmounted)
    ));
    assert!(container.close(&mut |_: &str| SaveDecision::Cancel).is_closed());
}

#[test]
fn clean_close_does_not_prompt() {
    let mut container = container();
    let outcome = container.close(&mut |_: &str| -> SaveDecision {
        panic!("prompted for an unmodified database")
    });
    assert!(outcome.is_closed());
}

#[test]
fn idle_container_closes_curtain_until_passphrase_matches() {
    let clock = Arc::new(ManualClock::new(0));
    let options = Arc::new(MemoryOptionsStore::with_values([(VIEW_CURTAIN_TIME, "60")]));
    let context = AppContext::new(options).with_clock(clock.clone());
    let mut container = PwsFileContainer::new(context);
    container.add_record(PwsRecord::new("a")).unwrap();
    container.change_passphrase(Passphrase::new("open sesame")).unwrap();

    clock.advance(120_000);
    assert!(!container.check_idle(), "virgin containers never curtain");

    container.mount(true).unwrap();
    container.select_indices(&[0]);
    clock.advance(59_000);
    assert!(!container.check_idle());
    clock.advance(2_000);
    assert!(container.check_idle());
    assert!(container.is_curtained());
    assert_eq!(container.selection_status(), SelectionStatus::NothingSelected);

    assert!(!container.lift_curtain(&Passphrase::new("wrong")));
    assert!(container.is_curtained());
    assert!(container.lift_curtain(&Passphrase::new("open sesame")));
    assert!(!container.is_curtained());
}
