use jpws_core::list::{ExpiryScope, OrderedListEvent, OrderedListListener, OrderedRecordList};
use jpws_core::model::record::{PwsRecord, RecordId};
use jpws_core::model::wrapper::SortField;
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

/// Replays list events onto a plain vector of IDs.
#[derive(Default)]
struct Replica {
    ids: Vec<RecordId>,
}

impl OrderedListListener for Replica {
    fn ordered_list_performed(&mut self, event: &OrderedListEvent) {
        match event {
            OrderedListEvent::ItemAdded { index, item } => self.ids.insert(*index, item.id()),
            OrderedListEvent::ItemUpdated { index, item } => self.ids[*index] = item.id(),
            OrderedListEvent::ItemRemoved { index, item, .. } => {
                assert_eq!(self.ids.remove(*index), item.id());
            }
            OrderedListEvent::ListReloaded { items } => {
                self.ids = items.iter().map(|item| item.id()).collect();
            }
            OrderedListEvent::ListCleared => self.ids.clear(),
        }
    }
}

#[derive(Debug, Clone)]
enum Op {
    Add(u8, String),
    Retitle(u8, String),
    Remove(u8),
}

fn op() -> impl Strategy<Value = Op> {
    let title = "[a-d]{0,3}";
    prop_oneof![
        (0u8..12, title).prop_map(|(slot, title)| Op::Add(slot, title)),
        (0u8..12, title).prop_map(|(slot, title)| Op::Retitle(slot, title)),
        (0u8..12).prop_map(Op::Remove),
    ]
}

fn slot_id(slot: u8) -> RecordId {
    Uuid::from_u128(u128::from(slot) + 1)
}

fn assert_consistent(list: &OrderedRecordList, replica: &Replica) {
    let items = list.items();
    for pair in items.windows(2) {
        assert!(pair[0].key() < pair[1].key(), "list out of order");
    }
    for (index, item) in items.iter().enumerate() {
        assert_eq!(list.index_of(item), Some(index));
        assert_eq!(list.index_of_id(item.id()), Some(index));
    }
    let ids: Vec<RecordId> = items.iter().map(|item| item.id()).collect();
    assert_eq!(replica.ids, ids);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn incremental_mutations_keep_order_and_index_consistent(ops in prop::collection::vec(op(), 1..60)) {
        let mut list = OrderedRecordList::new(SortField::Title);
        let replica = Rc::new(RefCell::new(Replica::default()));
        list.add_listener(replica.clone());
        list.load_database(std::iter::empty(), ExpiryScope::default());
        let mut stored: Vec<Option<PwsRecord>> = vec![None; 12];

        for op in ops {
            match op {
                Op::Add(slot, title) => {
                    let record = PwsRecord::with_id(slot_id(slot), title);
                    list.add(&record);
                    stored[usize::from(slot)] = Some(record);
                }
                Op::Retitle(slot, title) => {
                    if let Some(record) = stored[usize::from(slot)].as_mut() {
                        record.title = title;
                        list.update_record(record);
                    }
                }
                Op::Remove(slot) => {
                    if stored[usize::from(slot)].take().is_some() {
                        prop_assert!(list.remove(slot_id(slot)).is_some());
                    } else {
                        prop_assert!(list.remove(slot_id(slot)).is_none());
                    }
                }
            }
            assert_consistent(&list, &replica.borrow());
        }

        let live = stored.iter().flatten().count();
        prop_assert_eq!(list.len(), live);
    }

    #[test]
    fn reload_matches_incremental_build(titles in prop::collection::vec("[a-z]{0,4}", 0..30)) {
        let records: Vec<PwsRecord> = titles
            .into_iter()
            .enumerate()
            .map(|(slot, title)| PwsRecord::with_id(Uuid::from_u128(slot as u128 + 1), title))
            .collect();

        let mut incremental = OrderedRecordList::new(SortField::Title);
        for record in &records {
            incremental.add(record);
        }
        let mut reloaded = OrderedRecordList::new(SortField::Title);
        reloaded.load_database(records.iter().rev(), ExpiryScope::default());

        let left: Vec<RecordId> = incremental.iter().map(|item| item.id()).collect();
        let right: Vec<RecordId> = reloaded.iter().map(|item| item.id()).collect();
        prop_assert_eq!(left, right);
    }
}
