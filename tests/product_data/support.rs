//! Test stores: a wrapper that records store calls and can fail on demand.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use product_data::{
    EntryStore, InMemoryEntryStore, ProductEntry, ScanOptions, SkuEntry, StoreError,
    UpsertInstruction,
};

/// Every store call made through a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchByKeys(usize),
    CountAll,
    EvaluateFilter { limit: usize },
    CountFiltered,
    UpsertBatch(usize),
    DeleteByKey,
    FindByProductId,
}

/// Wraps an [`InMemoryEntryStore`], logging each call. When `fail_on_upsert`
/// is set, the n-th `upsert_batch` call (1-based) fails without writing.
#[derive(Clone, Default)]
pub struct RecordingStore {
    pub inner: InMemoryEntryStore,
    calls: Arc<Mutex<Vec<Call>>>,
    upserts: Arc<AtomicUsize>,
    fail_on_upsert: Option<usize>,
}

impl RecordingStore {
    pub fn new(max_ops_per_call: usize) -> Self {
        Self {
            inner: InMemoryEntryStore::with_max_ops(max_ops_per_call),
            ..Self::default()
        }
    }

    pub fn failing_on_upsert(mut self, nth: usize) -> Self {
        self.fail_on_upsert = Some(nth);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl EntryStore for RecordingStore {
    fn max_ops_per_call(&self) -> usize {
        self.inner.max_ops_per_call()
    }

    fn fetch_by_keys(&self, keys: &[&str]) -> Result<Vec<SkuEntry>, StoreError> {
        self.record(Call::FetchByKeys(keys.len()));
        self.inner.fetch_by_keys(keys)
    }

    fn count_all(&self) -> Result<u64, StoreError> {
        self.record(Call::CountAll);
        self.inner.count_all()
    }

    fn evaluate_filter(&self, options: &ScanOptions) -> Result<Vec<SkuEntry>, StoreError> {
        self.record(Call::EvaluateFilter {
            limit: options.limit,
        });
        self.inner.evaluate_filter(options)
    }

    fn count_filtered(&self, filter: Option<&str>) -> Result<u64, StoreError> {
        self.record(Call::CountFiltered);
        self.inner.count_filtered(filter)
    }

    fn upsert_batch(&self, instructions: &[UpsertInstruction]) -> Result<(), StoreError> {
        self.record(Call::UpsertBatch(instructions.len()));
        let n = self.upserts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_upsert == Some(n) {
            return Err(StoreError::Storage(format!("upsert call {} refused", n)));
        }
        self.inner.upsert_batch(instructions)
    }

    fn delete_by_key(&self, key: &str) -> Result<bool, StoreError> {
        self.record(Call::DeleteByKey);
        self.inner.delete_by_key(key)
    }

    fn find_by_product_id(&self, product_id: &str) -> Result<Option<SkuEntry>, StoreError> {
        self.record(Call::FindByProductId);
        self.inner.find_by_product_id(product_id)
    }
}

/// `count` SKU entries named `SKU-00000`.. each with one product.
pub fn numbered_entries(count: usize) -> Vec<SkuEntry> {
    (0..count)
        .map(|i| SkuEntry::new(format!("SKU-{:05}", i), vec![ProductEntry::new(format!("P{}", i))]))
        .collect()
}

pub fn product_ids(entry: &SkuEntry) -> Vec<&str> {
    entry
        .product_list
        .iter()
        .map(|p| p.product_id.as_str())
        .collect()
}
