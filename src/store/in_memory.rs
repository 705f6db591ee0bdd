//! InMemoryEntryStore - ordered in-process Entry Store for tests, development
//! and single-node deployments.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use serde_json::Value;

use super::filter::Filter;
use super::{EntryStore, ScanOptions, SortOrder, StoreError, UpsertInstruction, MAX_OPS_PER_CALL};
use crate::sku::SkuEntry;

/// In-memory entry store backed by a `BTreeMap` keyed by `sku`.
///
/// Documents are kept serialized, as a remote store would keep them, so every
/// read hands out an independent copy. Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryEntryStore {
    storage: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    batch_sizes: Arc<Mutex<Vec<usize>>>,
    max_ops_per_call: usize,
}

impl Default for InMemoryEntryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEntryStore {
    /// Create a new empty store accepting [`MAX_OPS_PER_CALL`] upserts per call.
    pub fn new() -> Self {
        Self::with_max_ops(MAX_OPS_PER_CALL)
    }

    /// Create a new empty store with a custom per-call upsert ceiling.
    ///
    /// A ceiling of zero is raised to one.
    pub fn with_max_ops(max_ops_per_call: usize) -> Self {
        Self {
            storage: Arc::new(RwLock::new(BTreeMap::new())),
            batch_sizes: Arc::new(Mutex::new(Vec::new())),
            max_ops_per_call: max_ops_per_call.max(1),
        }
    }

    /// Sizes of every `upsert_batch` call received so far, in call order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes
            .lock()
            .map(|sizes| sizes.clone())
            .unwrap_or_default()
    }

    /// Fetch a single entry by key.
    pub fn get(&self, key: &str) -> Result<Option<SkuEntry>, StoreError> {
        let storage = self.read()?;
        storage.get(key).map(|bytes| decode(bytes)).transpose()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, Vec<u8>>>, StoreError> {
        self.storage
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, Vec<u8>>>, StoreError> {
        self.storage
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))
    }
}

fn decode(bytes: &[u8]) -> Result<SkuEntry, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serde(e.to_string()))
}

fn decode_value(bytes: &[u8]) -> Result<Value, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serde(e.to_string()))
}

fn parse_filter(filter: Option<&str>) -> Result<Option<Filter>, StoreError> {
    match filter.map(str::trim) {
        None | Some("") => Ok(None),
        Some(expr) => Filter::parse(expr).map(Some),
    }
}

impl EntryStore for InMemoryEntryStore {
    fn max_ops_per_call(&self) -> usize {
        self.max_ops_per_call
    }

    fn fetch_by_keys(&self, keys: &[&str]) -> Result<Vec<SkuEntry>, StoreError> {
        let storage = self.read()?;
        keys.iter()
            .filter_map(|key| storage.get(*key))
            .map(|bytes| decode(bytes))
            .collect()
    }

    fn count_all(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.len() as u64)
    }

    fn evaluate_filter(&self, options: &ScanOptions) -> Result<Vec<SkuEntry>, StoreError> {
        let filter = parse_filter(options.filter.as_deref())?;
        let storage = self.read()?;

        let documents: Box<dyn Iterator<Item = &Vec<u8>>> = match options.order {
            SortOrder::Ascending => Box::new(storage.values()),
            SortOrder::Descending => Box::new(storage.values().rev()),
        };

        let mut results = Vec::new();
        let mut skipped = 0;
        for bytes in documents {
            if results.len() >= options.limit {
                break;
            }
            if let Some(filter) = &filter {
                if !filter.matches(&decode_value(bytes)?) {
                    continue;
                }
            }
            if skipped < options.skip {
                skipped += 1;
                continue;
            }
            results.push(decode(bytes)?);
        }

        Ok(results)
    }

    fn count_filtered(&self, filter: Option<&str>) -> Result<u64, StoreError> {
        let filter = parse_filter(filter)?;
        let storage = self.read()?;

        let Some(filter) = filter else {
            return Ok(storage.len() as u64);
        };

        let mut count = 0;
        for bytes in storage.values() {
            if filter.matches(&decode_value(bytes)?) {
                count += 1;
            }
        }
        Ok(count)
    }

    fn upsert_batch(&self, instructions: &[UpsertInstruction]) -> Result<(), StoreError> {
        if instructions.len() > self.max_ops_per_call {
            return Err(StoreError::BatchTooLarge {
                len: instructions.len(),
                max: self.max_ops_per_call,
            });
        }

        // Serialize everything first so a bad document leaves the store untouched.
        let encoded = instructions
            .iter()
            .map(|instruction| {
                serde_json::to_vec(&instruction.document)
                    .map(|bytes| (instruction.key.clone(), bytes))
                    .map_err(|e| StoreError::Serde(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut storage = self.write()?;
        for (key, bytes) in encoded {
            storage.insert(key, bytes);
        }
        drop(storage);

        if let Ok(mut sizes) = self.batch_sizes.lock() {
            sizes.push(instructions.len());
        }
        Ok(())
    }

    fn delete_by_key(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.write()?.remove(key).is_some())
    }

    fn find_by_product_id(&self, product_id: &str) -> Result<Option<SkuEntry>, StoreError> {
        let storage = self.read()?;
        for bytes in storage.values() {
            let mut entry = decode(bytes)?;
            if let Some(product) = entry
                .product_list
                .iter()
                .find(|p| p.product_id == product_id)
                .cloned()
            {
                entry.product_list = vec![product];
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }
}
