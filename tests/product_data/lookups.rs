//! Point lookups and deletes.

use product_data::{EntryStore, IncomingProduct, ProductData, ProductDataError, ProductEntry, SkuEntry};
use serde_json::json;

use crate::support::{product_ids, RecordingStore};

fn service() -> (RecordingStore, ProductData<RecordingStore>) {
    let store = RecordingStore::new(1000);
    let service = ProductData::new(store.clone());
    service
        .insert(vec![
            SkuEntry::new("A", vec![ProductEntry::new("P1"), ProductEntry::new("P2")]),
            SkuEntry::new("B", vec![ProductEntry::new("P3").with_being_read(0.25)]),
        ])
        .unwrap();
    (store, service)
}

#[test]
fn get_by_product_id_narrows_to_the_product() {
    let (_, service) = service();

    let entry = service.get_by_product_id("P2").unwrap();

    assert_eq!(entry.sku, "A");
    assert_eq!(product_ids(&entry), vec!["P2"]);
}

#[test]
fn get_by_product_id_not_found() {
    let (_, service) = service();

    let err = service.get_by_product_id("P404").unwrap_err();

    assert!(matches!(err, ProductDataError::NotFound(_)));
    assert_eq!(err.status_code(), 404);
}

#[test]
fn product_id_longer_than_limit_is_rejected() {
    let (_, service) = service();
    let long_id = "9".repeat(1025);

    let err = service.get_by_product_id(&long_id).unwrap_err();

    assert!(matches!(err, ProductDataError::Validation(_)));
}

#[test]
fn delete_by_sku_removes_entry() {
    let (store, service) = service();

    service.delete_by_sku("A").unwrap();

    assert!(store.inner.get("A").unwrap().is_none());
    assert_eq!(store.inner.count_all().unwrap(), 1);
    assert!(matches!(
        service.delete_by_sku("A"),
        Err(ProductDataError::NotFound(_))
    ));
}

#[test]
fn ingest_merges_broker_records_into_existing_skus() {
    let (store, service) = service();
    let records: Vec<IncomingProduct> = serde_json::from_value(json!([
        { "upc": "P2", "sku": "A", "dailyTurn": 0.75, "metadata": { "source": "broker" } },
        { "upc": "P9", "sku": "A" },
        { "upc": "P10", "sku": "C", "metadata": null }
    ]))
    .unwrap();

    assert_eq!(service.ingest(records).unwrap(), 2);

    let a = store.inner.get("A").unwrap().unwrap();
    assert_eq!(product_ids(&a), vec!["P1", "P2", "P9"]);
    assert_eq!(a.product("P2").unwrap().daily_turn, 0.75);
    assert_eq!(a.product("P2").unwrap().metadata["source"], "broker");
    assert_eq!(product_ids(&store.inner.get("C").unwrap().unwrap()), vec!["P10"]);
}
