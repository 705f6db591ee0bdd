//! Batch upsert executor - writes entries in groups the store can accept.
//!
//! Each entry becomes one upsert instruction. Instructions are split into
//! consecutive groups of at most `max_ops_per_call` and sent one group per
//! store call, in order. Groups are independent: when one fails, the groups
//! already written stay written and the failure is returned.

use std::ops::Range;

use tracing::{debug, warn};

use crate::error::ProductDataError;
use crate::observer::Observer;
use crate::sku::SkuEntry;
use crate::store::{EntryStore, UpsertInstruction};

/// Index ranges of the groups for `len` instructions at `max_per_group` each.
///
/// Every range but the last holds exactly `max_per_group` items. A group
/// size of zero is treated as one.
pub fn partition(len: usize, max_per_group: usize) -> Vec<Range<usize>> {
    let size = max_per_group.max(1);
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

/// Upsert `entries` into `store`, one group per call.
///
/// Returns the number of entries written. An empty batch makes no store call.
pub fn upsert_all<S: EntryStore + ?Sized>(
    store: &S,
    entries: Vec<SkuEntry>,
    observer: &dyn Observer,
) -> Result<usize, ProductDataError> {
    let instructions: Vec<UpsertInstruction> =
        entries.into_iter().map(UpsertInstruction::from).collect();
    let groups = partition(instructions.len(), store.max_ops_per_call());
    let total_groups = groups.len();

    let mut written = 0;
    for (index, range) in groups.into_iter().enumerate() {
        let group = &instructions[range];
        if let Err(err) = store.upsert_batch(group) {
            warn!(
                group = index,
                groups = total_groups,
                committed = written,
                error = %err,
                "upsert group failed, earlier groups stay committed"
            );
            return Err(err.into());
        }
        written += group.len();
        observer.record_processed(group.len());
        debug!(group = index, groups = total_groups, size = group.len(), "upsert group committed");
    }

    Ok(written)
}
