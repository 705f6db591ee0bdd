//! Query retrieval engine - turns query directives into one response shape.
//!
//! Directives are classified, in precedence order, into one of five modes:
//!
//! | directives | mode | response |
//! |---|---|---|
//! | `$count` alone | [`RetrieveMode::TotalCount`] | count of the whole store |
//! | `$count` + others | [`RetrieveMode::FilteredCount`] | size of the matching page |
//! | `$inlinecount=allpages` | [`RetrieveMode::InlineCount`] | a page of matching entries and its size |
//! | `$top` | [`RetrieveMode::Top`] | matching entries, at most `$top` |
//! | anything else | [`RetrieveMode::Filter`] | matching entries |
//!
//! `$count` together with `$inlinecount=allpages` is ambiguous and rejected.
//! The page size never exceeds the caller's `max_size`, whatever `$top` asks for.
//! Every mode but the total count fetches one page, and a count reported with
//! it is the number of entries in that page.

mod directives;

use tracing::debug;

use crate::error::ProductDataError;
use crate::sku::{CountResult, SkuEntry};
use crate::store::{EntryStore, ScanOptions, SortOrder};

pub use directives::{QueryDirectives, INLINE_COUNT_ALL_PAGES};

/// How a set of directives is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieveMode {
    /// `$count` alone: total row count, no filter evaluation.
    TotalCount,
    /// `$count` with other directives: size of the matching page only.
    FilteredCount,
    /// `$inlinecount=allpages`: a page of matching entries plus its size.
    InlineCount,
    /// `$top` without count directives: a page of matching entries.
    Top,
    /// Plain (possibly empty) filter: matching entries.
    Filter,
}

impl RetrieveMode {
    /// Classify directives, rejecting conflicting count semantics.
    pub fn classify(directives: &QueryDirectives) -> Result<Self, ProductDataError> {
        if directives.is_pure_count() {
            return Ok(RetrieveMode::TotalCount);
        }
        if directives.count && directives.inline_count_all_pages() {
            return Err(ProductDataError::Validation(
                "$count and $inlinecount=allpages cannot be combined".into(),
            ));
        }
        Ok(if directives.inline_count_all_pages() {
            RetrieveMode::InlineCount
        } else if directives.count {
            RetrieveMode::FilteredCount
        } else if directives.top.is_some() {
            RetrieveMode::Top
        } else {
            RetrieveMode::Filter
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RetrieveMode::TotalCount => "total_count",
            RetrieveMode::FilteredCount => "filtered_count",
            RetrieveMode::InlineCount => "inline_count",
            RetrieveMode::Top => "top",
            RetrieveMode::Filter => "filter",
        }
    }
}

/// The answer to a retrieve request.
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieved {
    /// A count with no entries.
    Count(CountResult),
    /// Entries with no count.
    Entries(Vec<SkuEntry>),
    /// Entries together with their count.
    EntriesWithCount {
        entries: Vec<SkuEntry>,
        count: CountResult,
    },
}

impl Retrieved {
    pub fn entries(&self) -> Option<&[SkuEntry]> {
        match self {
            Retrieved::Count(_) => None,
            Retrieved::Entries(entries) | Retrieved::EntriesWithCount { entries, .. } => {
                Some(entries)
            }
        }
    }

    pub fn count(&self) -> Option<CountResult> {
        match self {
            Retrieved::Count(count) | Retrieved::EntriesWithCount { count, .. } => Some(*count),
            Retrieved::Entries(_) => None,
        }
    }

    /// Split into the optional entries and optional count.
    pub fn into_parts(self) -> (Option<Vec<SkuEntry>>, Option<CountResult>) {
        match self {
            Retrieved::Count(count) => (None, Some(count)),
            Retrieved::Entries(entries) => (Some(entries), None),
            Retrieved::EntriesWithCount { entries, count } => (Some(entries), Some(count)),
        }
    }
}

/// Effective page size: `$top` clamped to `max_size`, or `max_size` when absent.
pub fn resolve_limit(top: Option<&str>, max_size: usize) -> Result<usize, ProductDataError> {
    match top {
        None => Ok(max_size),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map(|requested| requested.min(max_size))
            .map_err(|_| ProductDataError::Validation("invalid $top value".into())),
    }
}

fn resolve_skip(skip: Option<&str>) -> Result<usize, ProductDataError> {
    match skip {
        None => Ok(0),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| ProductDataError::Validation("invalid $skip value".into())),
    }
}

fn resolve_order(order_by: Option<&str>) -> Result<SortOrder, ProductDataError> {
    let Some(raw) = order_by else {
        return Ok(SortOrder::Ascending);
    };
    let parts: Vec<&str> = raw.split_whitespace().collect();
    match parts.as_slice() {
        ["sku"] => Ok(SortOrder::Ascending),
        ["sku", direction] if direction.eq_ignore_ascii_case("asc") => Ok(SortOrder::Ascending),
        ["sku", direction] if direction.eq_ignore_ascii_case("desc") => Ok(SortOrder::Descending),
        _ => Err(ProductDataError::Validation(format!(
            "unsupported $orderby value '{}'",
            raw
        ))),
    }
}

/// Answer a retrieve request against `store`.
///
/// Every directive is validated before the store is read.
pub fn retrieve<S: EntryStore + ?Sized>(
    store: &S,
    directives: &QueryDirectives,
    max_size: usize,
) -> Result<Retrieved, ProductDataError> {
    let mode = RetrieveMode::classify(directives)?;

    if mode == RetrieveMode::TotalCount {
        let count = store.count_all()?;
        debug!(mode = mode.as_str(), count, "retrieved");
        return Ok(Retrieved::Count(CountResult::new(count)));
    }

    let options = ScanOptions {
        filter: directives.filter.clone(),
        limit: resolve_limit(directives.top.as_deref(), max_size)?,
        skip: resolve_skip(directives.skip.as_deref())?,
        order: resolve_order(directives.order_by.as_deref())?,
    };

    let entries = store.evaluate_filter(&options)?;
    let count = CountResult::new(entries.len() as u64);
    let retrieved = match mode {
        RetrieveMode::FilteredCount => Retrieved::Count(count),
        RetrieveMode::InlineCount => Retrieved::EntriesWithCount { entries, count },
        RetrieveMode::Top | RetrieveMode::Filter | RetrieveMode::TotalCount => {
            Retrieved::Entries(entries)
        }
    };

    debug!(
        mode = mode.as_str(),
        limit = options.limit,
        entries = retrieved.entries().map(|e| e.len()),
        count = retrieved.count().map(|c| c.count),
        "retrieved"
    );
    Ok(retrieved)
}
