//! SKU entries - the records kept by the product data store.
//!
//! A [`SkuEntry`] maps one business identifier (the SKU) to the products
//! sold under it. Entries are keyed uniquely by `sku`; within an entry the
//! products are keyed by `productId`.
//!
//! ## Example
//!
//! ```
//! use product_data::{ProductEntry, SkuEntry};
//!
//! let entry = SkuEntry::new(
//!     "MS122-32",
//!     vec![ProductEntry::new("00888446671444").with_daily_turn(0.25)],
//! );
//! assert_eq!(entry.product("00888446671444").unwrap().daily_turn, 0.25);
//! ```

pub mod schema;

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Arbitrary caller-supplied product attributes. Opaque to the store.
pub type Metadata = Map<String, Value>;

/// One SKU and the products associated with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuEntry {
    pub sku: String,
    #[serde(default)]
    pub product_list: Vec<ProductEntry>,
}

impl SkuEntry {
    pub fn new(sku: impl Into<String>, product_list: Vec<ProductEntry>) -> Self {
        Self {
            sku: sku.into(),
            product_list,
        }
    }

    /// Find a product of this SKU by its product id.
    pub fn product(&self, product_id: &str) -> Option<&ProductEntry> {
        self.product_list
            .iter()
            .find(|p| p.product_id == product_id)
    }
}

/// One product associated with a SKU.
///
/// The four numeric attributes are fractions in `[0, 1]`; absent values
/// deserialize as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductEntry {
    pub product_id: String,
    #[serde(default)]
    pub being_read: f64,
    #[serde(default)]
    pub becoming_readable: f64,
    #[serde(default)]
    pub exit_error: f64,
    #[serde(default)]
    pub daily_turn: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: Metadata,
}

impl ProductEntry {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            being_read: 0.0,
            becoming_readable: 0.0,
            exit_error: 0.0,
            daily_turn: 0.0,
            metadata: Metadata::new(),
        }
    }

    pub fn with_being_read(mut self, value: f64) -> Self {
        self.being_read = value;
        self
    }

    pub fn with_becoming_readable(mut self, value: f64) -> Self {
        self.becoming_readable = value;
        self
    }

    pub fn with_exit_error(mut self, value: f64) -> Self {
        self.exit_error = value;
        self
    }

    pub fn with_daily_turn(mut self, value: f64) -> Self {
        self.daily_turn = value;
        self
    }

    /// Set a single metadata attribute.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Replace every mutable field with the values from `incoming`.
    ///
    /// The product id is left untouched. Metadata is replaced as a whole,
    /// not merged key by key.
    pub fn overwrite_from(&mut self, incoming: &ProductEntry) {
        self.metadata = incoming.metadata.clone();
        self.daily_turn = incoming.daily_turn;
        self.becoming_readable = incoming.becoming_readable;
        self.being_read = incoming.being_read;
        self.exit_error = incoming.exit_error;
    }
}

/// A row count returned instead of, or alongside, SKU entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResult {
    pub count: u64,
}

impl CountResult {
    pub fn new(count: u64) -> Self {
        Self { count }
    }
}

/// A flat product record as delivered by the upstream broker.
///
/// The broker names the product id `upc`, whatever kind of id it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingProduct {
    #[serde(rename = "upc")]
    pub product_id: String,
    pub sku: String,
    #[serde(default)]
    pub being_read: f64,
    #[serde(default)]
    pub becoming_readable: f64,
    #[serde(default)]
    pub exit_error: f64,
    #[serde(default)]
    pub daily_turn: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: Metadata,
}

impl From<IncomingProduct> for ProductEntry {
    fn from(record: IncomingProduct) -> Self {
        ProductEntry {
            product_id: record.product_id,
            being_read: record.being_read,
            becoming_readable: record.becoming_readable,
            exit_error: record.exit_error,
            daily_turn: record.daily_turn,
            metadata: record.metadata,
        }
    }
}

/// Group flat broker records into one [`SkuEntry`] per SKU.
///
/// SKUs come out in order of first appearance and each product list keeps
/// the input order of its records.
pub fn group_by_sku(records: Vec<IncomingProduct>) -> Vec<SkuEntry> {
    let mut grouped: Vec<SkuEntry> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        match positions.get(&record.sku) {
            Some(&index) => grouped[index].product_list.push(record.into()),
            None => {
                positions.insert(record.sku.clone(), grouped.len());
                let sku = record.sku.clone();
                grouped.push(SkuEntry::new(sku, vec![record.into()]));
            }
        }
    }

    grouped
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Metadata>::deserialize(deserializer)?.unwrap_or_default())
}
