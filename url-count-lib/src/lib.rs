//! # URL Count Library
//!
//! Fetches URLs read from a line stream and counts a literal pattern in each
//! response body, with a fixed upper bound on requests in flight.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use url_count_lib::UrlCounter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let counter = UrlCounter::new()?;
//!     let result = counter.count_url("https://go.dev").await?;
//!
//!     println!("{}: {}", result.url, result.count);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Dispatcher** ([`UrlCounter::run`]): read a line, launch a task, repeat
//! - **Admission gate** ([`AdmissionGate`]): at most k tasks alive, none idle
//! - **Completion barrier** ([`CompletionBarrier`]): wait for every task
//! - **Aggregator** ([`Aggregator`]): atomic running total
//! - **Fetcher** ([`Fetch`], [`HttpFetcher`]): GET a URL, return its body
//! - **Counter** ([`count_occurrences`]): non-overlapping substring count

// Re-export main public API types and functions
// This makes them available as url_count_lib::TypeName
pub use aggregator::Aggregator;
pub use concurrent::{AdmissionGate, AdmissionToken, CompletionBarrier, CompletionGuard};
pub use config::{
    load_env_config, load_env_config_from, parse_duration, ConfigManager, DefaultsConfig,
    EnvConfig, FileConfig,
};
pub use counter::UrlCounter;
pub use error::UrlCountError;
pub use fetcher::{Fetch, HttpFetcher};
pub use report::{format_count_line, format_total_line, CollectingReporter, NoopReporter, Reporter};
pub use types::{
    CountConfig, RunSummary, UrlCount, DEFAULT_CONCURRENCY, DEFAULT_IDLE_TIMEOUT,
    DEFAULT_PATTERN, MAX_CONCURRENCY,
};
pub use utils::{count_occurrences, parse_url, trim_line_ending};

// Re-exported so `Fetch` implementors don't need their own reqwest/bytes deps
pub use bytes::Bytes;
pub use reqwest::Url;

// Internal modules - these are not part of the public API
mod aggregator;
mod concurrent;
mod config;
mod counter;
mod error;
mod fetcher;
mod report;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, UrlCountError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
