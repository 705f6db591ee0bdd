//! Instrumentation hooks for the product data operations.
//!
//! Attach an [`Observer`] to a [`ProductData`](crate::ProductData) to collect
//! attempts, outcomes and latencies. Operations behave the same with or
//! without one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::ProductDataError;

/// The operations reported to an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Retrieve,
    Insert,
    Ingest,
    GetByProductId,
    DeleteBySku,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Retrieve => "retrieve",
            Operation::Insert => "insert",
            Operation::Ingest => "ingest",
            Operation::GetByProductId => "get_by_product_id",
            Operation::DeleteBySku => "delete_by_sku",
        }
    }
}

/// Receives instrumentation events.
pub trait Observer: Send + Sync {
    fn record_attempt(&self, op: Operation);

    fn record_success(&self, op: Operation);

    fn record_error(&self, op: Operation, error: &ProductDataError);

    fn record_latency(&self, op: Operation, elapsed: Duration);

    /// Entries written by an insert, reported after each committed group.
    fn record_processed(&self, _count: usize) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn record_attempt(&self, _op: Operation) {}

    fn record_success(&self, _op: Operation) {}

    fn record_error(&self, _op: Operation, _error: &ProductDataError) {}

    fn record_latency(&self, _op: Operation, _elapsed: Duration) {}
}

/// Point-in-time copy of a [`CountingObserver`]'s counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserverSnapshot {
    pub attempts: u64,
    pub successes: u64,
    pub errors: u64,
    pub validation_errors: u64,
    pub processed: u64,
    pub total_latency_micros: u64,
}

/// Observer keeping running totals in atomic counters.
#[derive(Debug, Default)]
pub struct CountingObserver {
    attempts: AtomicU64,
    successes: AtomicU64,
    errors: AtomicU64,
    validation_errors: AtomicU64,
    processed: AtomicU64,
    total_latency_micros: AtomicU64,
}

impl CountingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ObserverSnapshot {
        ObserverSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            validation_errors: self.validation_errors.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            total_latency_micros: self.total_latency_micros.load(Ordering::Relaxed),
        }
    }
}

impl Observer for CountingObserver {
    fn record_attempt(&self, _op: Operation) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    fn record_success(&self, _op: Operation) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self, _op: Operation, error: &ProductDataError) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        if matches!(error, ProductDataError::Validation(_)) {
            self.validation_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_latency(&self, _op: Operation, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.total_latency_micros.fetch_add(micros, Ordering::Relaxed);
    }

    fn record_processed(&self, count: usize) {
        self.processed.fetch_add(count as u64, Ordering::Relaxed);
    }
}
