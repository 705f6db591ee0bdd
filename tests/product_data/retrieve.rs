//! Retrieve path: directive precedence, page-size ceiling, response shapes.

use product_data::{
    CountResult, ProductData, ProductDataError, ProductEntry, QueryDirectives, SkuEntry,
};

use crate::support::{numbered_entries, Call, RecordingStore};

fn seeded(entries: Vec<SkuEntry>) -> (RecordingStore, ProductData<RecordingStore>) {
    let store = RecordingStore::new(1000);
    let service = ProductData::new(store.clone());
    service.insert(entries).unwrap();
    store.clear_calls();
    (store, service)
}

fn catalog() -> Vec<SkuEntry> {
    vec![
        SkuEntry::new("X", vec![ProductEntry::new("1").with_daily_turn(0.5)]),
        SkuEntry::new("X-2", vec![ProductEntry::new("2")]),
        SkuEntry::new("Y", vec![ProductEntry::new("3"), ProductEntry::new("4")]),
    ]
}

#[test]
fn pure_count_returns_total_rows() {
    let (store, service) = seeded(catalog());

    let retrieved = service
        .retrieve(&QueryDirectives::new().with_count(), 1)
        .unwrap();

    assert_eq!(retrieved.into_parts(), (None, Some(CountResult::new(3))));
    assert_eq!(store.calls(), vec![Call::CountAll]);
}

#[test]
fn count_with_filter_returns_only_the_count() {
    let (store, service) = seeded(catalog());
    let directives = QueryDirectives::new()
        .with_count()
        .with_filter("sku eq 'X'");

    let (entries, count) = service.retrieve(&directives, 100).unwrap().into_parts();

    assert!(entries.is_none());
    assert_eq!(count, Some(CountResult::new(1)));
    assert_eq!(store.calls(), vec![Call::EvaluateFilter { limit: 100 }]);
}

#[test]
fn count_with_filter_is_bounded_by_max_size() {
    let entries = (0..5)
        .map(|i| SkuEntry::new(format!("X{}", i), vec![ProductEntry::new(format!("{}", i))]))
        .collect();
    let (store, service) = seeded(entries);
    let directives = QueryDirectives::new()
        .with_count()
        .with_filter("startswith(sku,'X')");

    let (entries, count) = service.retrieve(&directives, 2).unwrap().into_parts();

    assert!(entries.is_none());
    assert_eq!(count, Some(CountResult::new(2)));
    assert_eq!(store.calls(), vec![Call::EvaluateFilter { limit: 2 }]);
}

#[test]
fn inline_count_returns_entries_and_count() {
    let (_, service) = seeded(catalog());
    let directives = QueryDirectives::new()
        .with_filter("sku eq 'X'")
        .with_inline_count("allpages");

    let (entries, count) = service.retrieve(&directives, 100).unwrap().into_parts();

    let entries = entries.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].sku, "X");
    assert_eq!(count, Some(CountResult::new(1)));
}

#[test]
fn inline_count_equals_page_length() {
    let (_, service) = seeded(catalog());
    let directives = QueryDirectives::new()
        .with_filter("startswith(sku,'X')")
        .with_top("1")
        .with_inline_count("allpages");

    let (entries, count) = service.retrieve(&directives, 100).unwrap().into_parts();

    assert_eq!(entries.unwrap().len(), 1);
    assert_eq!(count, Some(CountResult::new(1)));
}

#[test]
fn top_is_clamped_to_max_size() {
    let (store, service) = seeded(numbered_entries(150));

    let retrieved = service
        .retrieve(&QueryDirectives::new().with_top("99999"), 100)
        .unwrap();

    assert_eq!(retrieved.entries().unwrap().len(), 100);
    assert!(retrieved.count().is_none());
    assert_eq!(store.calls(), vec![Call::EvaluateFilter { limit: 100 }]);
}

#[test]
fn missing_top_defaults_to_max_size() {
    let (store, service) = seeded(numbered_entries(5));

    let retrieved = service.retrieve(&QueryDirectives::new(), 3).unwrap();

    assert_eq!(retrieved.entries().unwrap().len(), 3);
    assert_eq!(store.calls(), vec![Call::EvaluateFilter { limit: 3 }]);
}

#[test]
fn invalid_top_fails_without_store_call() {
    let (store, service) = seeded(catalog());

    let err = service
        .retrieve(&QueryDirectives::new().with_top("abc"), 100)
        .unwrap_err();

    assert_eq!(err, ProductDataError::Validation("invalid $top value".into()));
    assert!(store.calls().is_empty());
}

#[test]
fn conflicting_count_directives_are_rejected() {
    let (store, service) = seeded(catalog());
    let directives = QueryDirectives::new()
        .with_count()
        .with_filter("sku eq 'X'")
        .with_inline_count("allpages");

    let err = service.retrieve(&directives, 100).unwrap_err();

    assert!(matches!(err, ProductDataError::Validation(_)));
    assert_eq!(err.status_code(), 400);
    assert!(store.calls().is_empty());
}

#[test]
fn malformed_filter_is_a_validation_error() {
    let (_, service) = seeded(catalog());

    let err = service
        .retrieve(&QueryDirectives::new().with_filter("sku eq 'X"), 100)
        .unwrap_err();

    assert!(matches!(err, ProductDataError::Validation(_)));
}

#[test]
fn filter_on_nested_product_fields() {
    let (_, service) = seeded(catalog());
    let directives = QueryDirectives::new().with_filter("productList.dailyTurn ge 0.5");

    let retrieved = service.retrieve(&directives, 100).unwrap();

    let skus: Vec<&str> = retrieved
        .entries()
        .unwrap()
        .iter()
        .map(|e| e.sku.as_str())
        .collect();
    assert_eq!(skus, vec!["X"]);
}

#[test]
fn no_matches_is_an_empty_success() {
    let (_, service) = seeded(catalog());

    let retrieved = service
        .retrieve(&QueryDirectives::new().with_filter("sku eq 'NONE'"), 100)
        .unwrap();

    assert_eq!(retrieved.entries(), Some(&[][..]));
}

#[test]
fn unconfigured_service_rejects_retrieve() {
    let service: ProductData<RecordingStore> = ProductData::unconfigured();
    assert_eq!(
        service
            .retrieve(&QueryDirectives::new().with_count(), 100)
            .unwrap_err(),
        ProductDataError::NoStore
    );
}

#[test]
fn count_with_non_directive_params_is_not_a_total_count() {
    let (store, service) = seeded(numbered_entries(5));
    let directives = QueryDirectives::from_pairs(vec![("$count", ""), ("foo", "bar")]).unwrap();

    let (entries, count) = service.retrieve(&directives, 3).unwrap().into_parts();

    assert!(entries.is_none());
    assert_eq!(count, Some(CountResult::new(3)));
    assert_eq!(store.calls(), vec![Call::EvaluateFilter { limit: 3 }]);
}

#[test]
fn select_returns_whole_entries() {
    let (_, service) = seeded(catalog());
    let directives =
        QueryDirectives::from_pairs(vec![("$top", "10"), ("$select", "sku")]).unwrap();

    let retrieved = service.retrieve(&directives, 100).unwrap();

    let entries = retrieved.entries().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2].product_list.len(), 2);
}
