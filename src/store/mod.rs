//! Entry Store - keyed persistence of SKU entries.
//!
//! The core never talks to a database directly. It goes through
//! [`EntryStore`], which any backend (document store, relational table with
//! a structured column, in-process map) can implement.
//!
//! ## Example
//!
//! ```
//! use product_data::{EntryStore, InMemoryEntryStore, ProductEntry, SkuEntry, UpsertInstruction};
//!
//! let store = InMemoryEntryStore::new();
//! let entry = SkuEntry::new("A", vec![ProductEntry::new("1")]);
//! store.upsert_batch(&[UpsertInstruction::from(entry)]).unwrap();
//! assert_eq!(store.count_all().unwrap(), 1);
//! ```

pub mod filter;
mod in_memory;

use thiserror::Error;

use crate::sku::SkuEntry;

pub use in_memory::InMemoryEntryStore;

/// Default ceiling on upsert instructions accepted in one store call.
pub const MAX_OPS_PER_CALL: usize = 1000;

/// Error type for Entry Store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The filter expression could not be parsed or evaluated.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    /// A single call carried more instructions than the store accepts.
    #[error("batch of {len} operations exceeds the limit of {max} per call")]
    BatchTooLarge { len: usize, max: usize },
    /// Serialization/deserialization error.
    #[error("entry serialization error: {0}")]
    Serde(String),
    /// Storage-level error.
    #[error("entry storage error: {0}")]
    Storage(String),
}

/// One logical upsert: replace (or create) the document stored under `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertInstruction {
    pub key: String,
    pub document: SkuEntry,
}

impl From<SkuEntry> for UpsertInstruction {
    fn from(document: SkuEntry) -> Self {
        Self {
            key: document.sku.clone(),
            document,
        }
    }
}

/// Sort direction for `$orderby`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Options for a filtered scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Filter expression; `None` matches every entry.
    pub filter: Option<String>,
    /// Maximum number of entries returned.
    pub limit: usize,
    /// Number of matching entries skipped before the first one returned.
    pub skip: usize,
    /// Order of the scan, by `sku`.
    pub order: SortOrder,
}

/// Abstract keyed storage for SKU entries.
///
/// Implementations must keep `sku` unique: an upsert replaces whatever is
/// stored under the same key.
pub trait EntryStore: Send + Sync {
    /// Largest number of upsert instructions accepted by one `upsert_batch` call.
    fn max_ops_per_call(&self) -> usize {
        MAX_OPS_PER_CALL
    }

    /// Fetch the stored entries for the given keys. Missing keys are skipped.
    fn fetch_by_keys(&self, keys: &[&str]) -> Result<Vec<SkuEntry>, StoreError>;

    /// Count every stored entry.
    fn count_all(&self) -> Result<u64, StoreError>;

    /// Scan entries matching the filter, applying ordering, skip and limit.
    fn evaluate_filter(&self, options: &ScanOptions) -> Result<Vec<SkuEntry>, StoreError>;

    /// Count entries matching the filter, ignoring paging.
    fn count_filtered(&self, filter: Option<&str>) -> Result<u64, StoreError>;

    /// Apply a group of upserts in one call.
    fn upsert_batch(&self, instructions: &[UpsertInstruction]) -> Result<(), StoreError>;

    /// Remove an entry by key. Returns true if it existed.
    fn delete_by_key(&self, key: &str) -> Result<bool, StoreError>;

    /// Find the entry holding a product, with its product list narrowed to
    /// that product.
    fn find_by_product_id(&self, product_id: &str) -> Result<Option<SkuEntry>, StoreError>;
}

impl<S: EntryStore + ?Sized> EntryStore for std::sync::Arc<S> {
    fn max_ops_per_call(&self) -> usize {
        (**self).max_ops_per_call()
    }

    fn fetch_by_keys(&self, keys: &[&str]) -> Result<Vec<SkuEntry>, StoreError> {
        (**self).fetch_by_keys(keys)
    }

    fn count_all(&self) -> Result<u64, StoreError> {
        (**self).count_all()
    }

    fn evaluate_filter(&self, options: &ScanOptions) -> Result<Vec<SkuEntry>, StoreError> {
        (**self).evaluate_filter(options)
    }

    fn count_filtered(&self, filter: Option<&str>) -> Result<u64, StoreError> {
        (**self).count_filtered(filter)
    }

    fn upsert_batch(&self, instructions: &[UpsertInstruction]) -> Result<(), StoreError> {
        (**self).upsert_batch(instructions)
    }

    fn delete_by_key(&self, key: &str) -> Result<bool, StoreError> {
        (**self).delete_by_key(key)
    }

    fn find_by_product_id(&self, product_id: &str) -> Result<Option<SkuEntry>, StoreError> {
        (**self).find_by_product_id(product_id)
    }
}
