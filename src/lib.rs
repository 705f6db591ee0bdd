mod batch;
pub mod config;
mod error;
#[cfg(feature = "http")]
pub mod http;
mod merge;
mod observer;
pub mod query;
mod service;
pub mod sku;
pub mod store;

pub use batch::{partition, upsert_all};
pub use config::{Config, ConfigError};
pub use error::ProductDataError;
pub use merge::{coalesce_by_sku, dedupe_products, merge_entries, merge_with_store, validate_entries};
pub use observer::{CountingObserver, NoopObserver, Observer, ObserverSnapshot, Operation};
pub use query::{retrieve, QueryDirectives, RetrieveMode, Retrieved};
pub use service::ProductData;
pub use sku::schema::{validate_payload, InsertPayload, SchemaViolation};
pub use sku::{group_by_sku, CountResult, IncomingProduct, Metadata, ProductEntry, SkuEntry};
pub use store::{
    EntryStore, InMemoryEntryStore, ScanOptions, SortOrder, StoreError, UpsertInstruction,
    MAX_OPS_PER_CALL,
};
