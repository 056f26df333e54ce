//! Core data types for URL counting.
//!
//! This module defines the configuration of a run, the per-URL result and
//! the summary returned once every task has finished.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of requests allowed in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Upper bound accepted for the concurrency limit.
pub const MAX_CONCURRENCY: usize = 100;

/// Default pattern counted in every response body.
pub const DEFAULT_PATTERN: &str = "Go";

/// Default lifetime of an idle pooled connection.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of counting the pattern in one URL's response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlCount {
    /// The parsed URL in its normalized string form
    pub url: String,

    /// Non-overlapping occurrences of the pattern in the body
    pub count: u64,

    /// Time spent fetching and counting
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Totals for a finished run.
///
/// Only produced after the completion barrier has been satisfied, so
/// `total` is final.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Sum of every per-URL count
    pub total: u64,

    /// Number of processing tasks launched (one per input line)
    pub dispatched: u64,

    /// Tasks that fetched, counted and reported their URL
    pub counted: u64,

    /// Tasks that exited early on a parse or fetch failure
    pub dropped: u64,
}

/// Configuration options for a counting run.
#[derive(Debug, Clone, PartialEq)]
pub struct CountConfig {
    /// Maximum number of processing tasks active at once
    /// Default: 5, Range: 1-100
    pub concurrency: usize,

    /// Literal, case-sensitive pattern to count
    /// Default: "Go"
    pub pattern: String,

    /// Optional upper bound on a single fetch, body included
    /// Default: none (a hung fetch holds its slot)
    pub timeout: Option<Duration>,

    /// How long an idle pooled connection is kept
    /// Default: 10 seconds
    pub idle_timeout: Duration,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            pattern: DEFAULT_PATTERN.to_string(),
            timeout: None,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl CountConfig {
    /// Set the concurrency limit, clamped to 1-100.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    /// Set the pattern to count.
    pub fn with_pattern<P: Into<String>>(mut self, pattern: P) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Bound every fetch by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the idle-connection timeout of the HTTP pool.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CountConfig::default();
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.pattern, "Go");
        assert_eq!(config.timeout, None);
        assert_eq!(config.idle_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_concurrency_is_clamped() {
        assert_eq!(CountConfig::default().with_concurrency(0).concurrency, 1);
        assert_eq!(CountConfig::default().with_concurrency(500).concurrency, 100);
        assert_eq!(CountConfig::default().with_concurrency(7).concurrency, 7);
    }
}
