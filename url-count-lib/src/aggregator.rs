//! Shared running total across processing tasks.

use std::sync::atomic::{AtomicU64, Ordering};

/// Concurrency-safe accumulator of per-URL counts.
///
/// Shared through an `Arc` handed to every task. [`total`] is only final once
/// the completion barrier has been passed; earlier reads may under-report
/// but never over-report.
///
/// [`total`]: Aggregator::total
#[derive(Debug, Default)]
pub struct Aggregator {
    total: AtomicU64,
    contributions: AtomicU64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically add one task's count.
    pub fn add(&self, count: u64) {
        self.total.fetch_add(count, Ordering::AcqRel);
        self.contributions.fetch_add(1, Ordering::AcqRel);
    }

    /// Current total.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    /// Number of `add` calls so far.
    pub fn contributions(&self) -> u64 {
        self.contributions.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_add_and_total() {
        let aggregator = Aggregator::new();
        assert_eq!(aggregator.total(), 0);

        aggregator.add(9);
        aggregator.add(0);
        aggregator.add(9);
        assert_eq!(aggregator.total(), 18);
        assert_eq!(aggregator.contributions(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds() {
        let aggregator = Arc::new(Aggregator::new());

        let handles: Vec<_> = (1..=100u64)
            .map(|n| {
                let aggregator = Arc::clone(&aggregator);
                tokio::spawn(async move { aggregator.add(n) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(aggregator.total(), 5050);
        assert_eq!(aggregator.contributions(), 100);
    }
}
