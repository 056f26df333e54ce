//! Reporting of per-URL results.
//!
//! Processing tasks hand each result to a [`Reporter`] as soon as it is
//! ready, so reports arrive in completion order, not input order.

use crate::error::UrlCountError;
use crate::types::UrlCount;
use std::sync::{Mutex, MutexGuard};

/// Receives per-URL outcomes from concurrently running tasks.
pub trait Reporter: Send + Sync {
    /// A URL was fetched and counted.
    fn url_counted(&self, result: &UrlCount);

    /// A URL was dropped on a parse or fetch failure. Silent by default.
    fn url_dropped(&self, _input: &str, _error: &UrlCountError) {}
}

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn url_counted(&self, _result: &UrlCount) {}
}

/// Reporter that keeps every outcome in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    counted: Mutex<Vec<UrlCount>>,
    dropped: Mutex<Vec<String>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results reported so far, in completion order.
    pub fn counted(&self) -> Vec<UrlCount> {
        lock(&self.counted).clone()
    }

    /// Raw input lines dropped so far.
    pub fn dropped(&self) -> Vec<String> {
        lock(&self.dropped).clone()
    }
}

impl Reporter for CollectingReporter {
    fn url_counted(&self, result: &UrlCount) {
        lock(&self.counted).push(result.clone());
    }

    fn url_dropped(&self, input: &str, _error: &UrlCountError) {
        lock(&self.dropped).push(input.to_string());
    }
}

// A panicking reporter must not take the others down with it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Format the report line for one counted URL.
///
/// ```
/// use url_count_lib::{format_count_line, UrlCount};
/// use std::time::Duration;
///
/// let result = UrlCount {
///     url: "https://example.test/".to_string(),
///     count: 9,
///     elapsed: Duration::ZERO,
/// };
/// assert_eq!(
///     format_count_line("Go", &result),
///     "Url: https://example.test/ - \"Go\" occurrence: 9"
/// );
/// ```
pub fn format_count_line(pattern: &str, result: &UrlCount) -> String {
    format!(
        "Url: {} - \"{}\" occurrence: {}",
        result.url, pattern, result.count
    )
}

/// Format the final total line.
pub fn format_total_line(total: u64) -> String {
    format!("Total: {}", total)
}
