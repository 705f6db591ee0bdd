//! ProductData - the operations exposed to the calling layer.
//!
//! `ProductData<S>` owns an optional Entry Store and an [`Observer`]. Every
//! operation checks for a configured store first and fails immediately with
//! [`ProductDataError::NoStore`] when there is none.
//!
//! ## Example
//!
//! ```
//! use product_data::{InMemoryEntryStore, ProductData, ProductEntry, QueryDirectives, SkuEntry};
//!
//! let service = ProductData::new(InMemoryEntryStore::new());
//! service
//!     .insert(vec![SkuEntry::new("A", vec![ProductEntry::new("P1")])])
//!     .unwrap();
//!
//! let retrieved = service
//!     .retrieve(&QueryDirectives::new().with_count(), 100)
//!     .unwrap();
//! assert_eq!(retrieved.count().unwrap().count, 1);
//! ```

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::batch::upsert_all;
use crate::error::ProductDataError;
use crate::merge::merge_with_store;
use crate::observer::{NoopObserver, Observer, Operation};
use crate::query::{self, QueryDirectives, Retrieved};
use crate::sku::schema::validate_product_id;
use crate::sku::{group_by_sku, IncomingProduct, SkuEntry};
use crate::store::EntryStore;

/// The product data core, generic over the Entry Store backend.
pub struct ProductData<S> {
    store: Option<S>,
    observer: Arc<dyn Observer>,
}

impl<S: EntryStore> ProductData<S> {
    /// Create a service backed by `store`.
    pub fn new(store: S) -> Self {
        Self {
            store: Some(store),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Create a service with no store. Every operation fails with
    /// [`ProductDataError::NoStore`].
    pub fn unconfigured() -> Self {
        Self {
            store: None,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Attach an observer. Uses builder pattern.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// The configured store.
    pub fn store(&self) -> Result<&S, ProductDataError> {
        self.store.as_ref().ok_or(ProductDataError::NoStore)
    }

    /// Answer a query. `max_size` caps the number of returned entries.
    pub fn retrieve(
        &self,
        directives: &QueryDirectives,
        max_size: usize,
    ) -> Result<Retrieved, ProductDataError> {
        self.observed(Operation::Retrieve, |store| {
            query::retrieve(store, directives, max_size)
        })
    }

    /// Merge `entries` with stored data and upsert the result.
    ///
    /// Returns the number of SKU entries written.
    pub fn insert(&self, entries: Vec<SkuEntry>) -> Result<usize, ProductDataError> {
        self.observed(Operation::Insert, |store| self.merge_and_upsert(store, entries))
    }

    /// Group flat broker records by SKU and insert them.
    pub fn ingest(&self, records: Vec<IncomingProduct>) -> Result<usize, ProductDataError> {
        self.observed(Operation::Ingest, |store| {
            let grouped = group_by_sku(records);
            debug!(skus = grouped.len(), "grouped broker records");
            self.merge_and_upsert(store, grouped)
        })
    }

    /// Find the SKU entry holding `product_id`, narrowed to that product.
    pub fn get_by_product_id(&self, product_id: &str) -> Result<SkuEntry, ProductDataError> {
        self.observed(Operation::GetByProductId, |store| {
            validate_product_id(product_id).map_err(ProductDataError::Validation)?;
            store
                .find_by_product_id(product_id)?
                .ok_or_else(|| ProductDataError::NotFound(format!("product {}", product_id)))
        })
    }

    /// Remove the entry stored under `sku`.
    pub fn delete_by_sku(&self, sku: &str) -> Result<(), ProductDataError> {
        self.observed(Operation::DeleteBySku, |store| {
            if store.delete_by_key(sku)? {
                info!(sku, "deleted sku");
                Ok(())
            } else {
                Err(ProductDataError::NotFound(format!("sku {}", sku)))
            }
        })
    }

    fn merge_and_upsert(&self, store: &S, entries: Vec<SkuEntry>) -> Result<usize, ProductDataError> {
        let merged = merge_with_store(store, entries)?;
        let written = upsert_all(store, merged, self.observer.as_ref())?;
        info!(count = written, "upserted sku entries");
        Ok(written)
    }

    fn observed<T, F>(&self, op: Operation, f: F) -> Result<T, ProductDataError>
    where
        F: FnOnce(&S) -> Result<T, ProductDataError>,
    {
        self.observer.record_attempt(op);
        let started = Instant::now();

        let result = self.store().and_then(f);

        self.observer.record_latency(op, started.elapsed());
        match &result {
            Ok(_) => self.observer.record_success(op),
            Err(err) => {
                self.observer.record_error(op, err);
                match err {
                    ProductDataError::Store(_) | ProductDataError::NoStore => {
                        warn!(op = op.as_str(), kind = err.kind(), error = %err, "operation failed")
                    }
                    _ => debug!(op = op.as_str(), kind = err.kind(), error = %err, "operation rejected"),
                }
            }
        }
        result
    }
}
