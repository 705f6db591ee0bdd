//! Insert path: merge with stored data, then bounded batch upserts.

use std::sync::Arc;

use product_data::{
    CountingObserver, EntryStore, ProductData, ProductDataError, ProductEntry, SkuEntry,
};

use crate::support::{numbered_entries, product_ids, Call, RecordingStore};

#[test]
fn inserting_twice_is_idempotent() {
    let store = RecordingStore::new(1000);
    let service = ProductData::new(store.clone());
    let entry = SkuEntry::new(
        "A",
        vec![
            ProductEntry::new("P1").with_daily_turn(0.4).with_meta("color", "blue"),
            ProductEntry::new("P2").with_exit_error(0.1),
        ],
    );

    service.insert(vec![entry.clone()]).unwrap();
    let once = store.inner.get("A").unwrap().unwrap();
    service.insert(vec![entry.clone()]).unwrap();
    let twice = store.inner.get("A").unwrap().unwrap();

    assert_eq!(once, entry);
    assert_eq!(once, twice);
    assert_eq!(store.inner.count_all().unwrap(), 1);
}

#[test]
fn merge_preserves_unmatched_products() {
    let store = RecordingStore::new(1000);
    let service = ProductData::new(store.clone());

    service
        .insert(vec![SkuEntry::new(
            "A",
            vec![ProductEntry::new("P1"), ProductEntry::new("P2")],
        )])
        .unwrap();
    service
        .insert(vec![SkuEntry::new("A", vec![ProductEntry::new("P3")])])
        .unwrap();

    let stored = store.inner.get("A").unwrap().unwrap();
    assert_eq!(product_ids(&stored), vec!["P1", "P2", "P3"]);
}

#[test]
fn merge_overwrites_matched_products() {
    let store = RecordingStore::new(1000);
    let service = ProductData::new(store.clone());

    service
        .insert(vec![SkuEntry::new(
            "A",
            vec![ProductEntry::new("P1").with_daily_turn(0.1)],
        )])
        .unwrap();
    service
        .insert(vec![SkuEntry::new(
            "A",
            vec![ProductEntry::new("P1").with_daily_turn(0.9)],
        )])
        .unwrap();

    let stored = store.inner.get("A").unwrap().unwrap();
    assert_eq!(stored.product_list.len(), 1);
    assert_eq!(stored.product("P1").unwrap().daily_turn, 0.9);
}

#[test]
fn duplicate_products_in_one_submission_keep_the_first() {
    let store = RecordingStore::new(1000);
    let service = ProductData::new(store.clone());

    service
        .insert(vec![SkuEntry::new(
            "A",
            vec![
                ProductEntry::new("X").with_meta("c", "blue"),
                ProductEntry::new("X").with_meta("c", "red"),
            ],
        )])
        .unwrap();

    let stored = store.inner.get("A").unwrap().unwrap();
    assert_eq!(stored.product_list.len(), 1);
    assert_eq!(stored.product_list[0].metadata["c"], "blue");
}

#[test]
fn large_batches_are_split_into_bounded_calls() {
    let store = RecordingStore::new(1000);
    let service = ProductData::new(store.clone());

    let written = service.insert(numbered_entries(2500)).unwrap();

    assert_eq!(written, 2500);
    let upserts: Vec<Call> = store
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::UpsertBatch(_)))
        .collect();
    assert_eq!(
        upserts,
        vec![Call::UpsertBatch(1000), Call::UpsertBatch(1000), Call::UpsertBatch(500)]
    );
    assert_eq!(store.inner.count_all().unwrap(), 2500);
}

#[test]
fn empty_batch_touches_nothing() {
    let store = RecordingStore::new(1000);
    let service = ProductData::new(store.clone());

    assert_eq!(service.insert(Vec::new()).unwrap(), 0);
    assert!(store.calls().is_empty());
}

#[test]
fn invalid_entry_fails_the_whole_batch() {
    let store = RecordingStore::new(1000);
    let service = ProductData::new(store.clone());

    let mut batch = numbered_entries(3);
    batch.push(SkuEntry::new("EMPTY", vec![]));

    let err = service.insert(batch).unwrap_err();

    assert!(matches!(err, ProductDataError::Validation(_)));
    assert!(store.calls().is_empty());
    assert_eq!(store.inner.count_all().unwrap(), 0);
}

#[test]
fn failed_group_keeps_earlier_groups_committed() {
    let store = RecordingStore::new(1000).failing_on_upsert(2);
    let observer = Arc::new(CountingObserver::new());
    let service = ProductData::new(store.clone()).with_observer(observer.clone());

    let err = service.insert(numbered_entries(2500)).unwrap_err();

    assert!(matches!(err, ProductDataError::Store(_)));
    assert_eq!(err.public_message(), "internal server error");
    assert_eq!(store.inner.count_all().unwrap(), 1000);
    assert_eq!(observer.snapshot().processed, 1000);
    assert_eq!(observer.snapshot().errors, 1);
}

#[test]
fn unconfigured_service_rejects_inserts() {
    let service: ProductData<RecordingStore> = ProductData::unconfigured();
    let err = service.insert(numbered_entries(1)).unwrap_err();
    assert_eq!(err, ProductDataError::NoStore);
    assert_eq!(err.to_string(), "no database connection");
}
