//! Merge engine - reconciles incoming SKU entries with what is already stored.
//!
//! An upsert never drops products that were stored earlier. For each incoming
//! entry whose SKU already exists:
//!
//! - a product with a known `productId` has its mutable fields replaced in
//!   place, keeping its stored position
//! - a product with a new `productId` is appended
//! - stored products absent from the submission are kept as they are
//!
//! Within one submission, the first occurrence of a `productId` wins and later
//! duplicates are dropped without merging their fields.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::ProductDataError;
use crate::sku::{ProductEntry, SkuEntry};
use crate::store::EntryStore;

/// Reject the batch if any entry has an empty SKU or an empty product list.
pub fn validate_entries(incoming: &[SkuEntry]) -> Result<(), ProductDataError> {
    if incoming
        .iter()
        .any(|entry| entry.sku.is_empty() || entry.product_list.is_empty())
    {
        return Err(ProductDataError::Validation(
            "unable to insert empty SKUs or product lists".into(),
        ));
    }
    Ok(())
}

/// Collapse products sharing a `productId`; the first occurrence wins.
pub fn dedupe_products(products: Vec<ProductEntry>) -> Vec<ProductEntry> {
    let mut seen: HashSet<String> = HashSet::with_capacity(products.len());
    products
        .into_iter()
        .filter(|product| seen.insert(product.product_id.clone()))
        .collect()
}

/// Fold repeated SKUs of one batch into their first occurrence, concatenating
/// product lists in batch order.
pub fn coalesce_by_sku(incoming: Vec<SkuEntry>) -> Vec<SkuEntry> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(incoming.len());
    let mut coalesced: Vec<SkuEntry> = Vec::with_capacity(incoming.len());

    for entry in incoming {
        match positions.get(&entry.sku) {
            Some(&index) => coalesced[index].product_list.extend(entry.product_list),
            None => {
                positions.insert(entry.sku.clone(), coalesced.len());
                coalesced.push(entry);
            }
        }
    }

    coalesced
}

/// Merge deduplicated incoming entries with the stored entries for the same
/// keys. Incoming entries without a stored counterpart pass through unchanged.
pub fn merge_entries(incoming: Vec<SkuEntry>, persisted: Vec<SkuEntry>) -> Vec<SkuEntry> {
    let mut stored: HashMap<String, SkuEntry> = persisted
        .into_iter()
        .map(|entry| (entry.sku.clone(), entry))
        .collect();

    incoming
        .into_iter()
        .map(|entry| match stored.remove(&entry.sku) {
            Some(current) => SkuEntry {
                product_list: merge_product_list(current.product_list, entry.product_list),
                sku: entry.sku,
            },
            None => entry,
        })
        .collect()
}

fn merge_product_list(current: Vec<ProductEntry>, incoming: Vec<ProductEntry>) -> Vec<ProductEntry> {
    let mut merged = current;
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(merged.len());
    for (index, product) in merged.iter().enumerate() {
        positions.entry(product.product_id.clone()).or_insert(index);
    }

    for product in incoming {
        match positions.get(&product.product_id) {
            Some(&index) => merged[index].overwrite_from(&product),
            None => {
                positions.insert(product.product_id.clone(), merged.len());
                merged.push(product);
            }
        }
    }

    merged
}

/// Run the full merge for a batch: validate, coalesce, deduplicate, load the
/// stored entries for the batch's keys and merge them in.
pub fn merge_with_store<S: EntryStore + ?Sized>(
    store: &S,
    incoming: Vec<SkuEntry>,
) -> Result<Vec<SkuEntry>, ProductDataError> {
    validate_entries(&incoming)?;
    if incoming.is_empty() {
        return Ok(Vec::new());
    }

    let prepared: Vec<SkuEntry> = coalesce_by_sku(incoming)
        .into_iter()
        .map(|entry| SkuEntry {
            product_list: dedupe_products(entry.product_list),
            sku: entry.sku,
        })
        .collect();

    let keys: Vec<&str> = prepared.iter().map(|entry| entry.sku.as_str()).collect();
    let persisted = store.fetch_by_keys(&keys)?;
    debug!(
        incoming = prepared.len(),
        persisted = persisted.len(),
        "merging entries with stored data"
    );

    Ok(merge_entries(prepared, persisted))
}
