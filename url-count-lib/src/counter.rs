//! Main URL counter implementation.
//!
//! This module provides [`UrlCounter`], which drives the read -> admit ->
//! launch loop over an input stream and runs one processing task per URL.

use crate::aggregator::Aggregator;
use crate::concurrent::{AdmissionGate, AdmissionToken, CompletionBarrier, CompletionGuard};
use crate::error::UrlCountError;
use crate::fetcher::{Fetch, HttpFetcher};
use crate::report::{NoopReporter, Reporter};
use crate::types::{CountConfig, RunSummary, UrlCount};
use crate::utils::{count_occurrences, parse_url, trim_line_ending};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::{JoinError, JoinSet};

/// Fetches URLs read from a line stream and counts a pattern in each body.
///
/// At most `config.concurrency` processing tasks are alive at any moment.
/// Tasks are spawned on demand, one per input line, so a short input never
/// creates more tasks than it has lines.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use url_count_lib::{CollectingReporter, CountConfig, UrlCounter};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let reporter = Arc::new(CollectingReporter::new());
///     let counter = UrlCounter::with_config(CountConfig::default())?
///         .with_reporter(reporter.clone());
///
///     let input: &[u8] = b"https://go.dev\nhttps://go.dev\n";
///     let summary = counter.run(input).await?;
///     println!("Total: {}", summary.total);
///     Ok(())
/// }
/// ```
pub struct UrlCounter {
    /// Configuration settings for this counter instance
    config: CountConfig,
    /// Transport shared by every task
    fetcher: Arc<dyn Fetch>,
    /// Receives per-URL outcomes
    reporter: Arc<dyn Reporter>,
    /// Bounds the number of live processing tasks
    gate: AdmissionGate,
    /// Pattern bytes shared by every task
    pattern: Arc<str>,
}

impl UrlCounter {
    /// Create a counter with the default configuration and HTTP fetcher.
    pub fn new() -> Result<Self, UrlCountError> {
        Self::with_config(CountConfig::default())
    }

    /// Create a counter whose HTTP fetcher is built from `config`.
    ///
    /// # Errors
    ///
    /// Returns `UrlCountError` if the pattern is empty or the HTTP client
    /// cannot be built.
    pub fn with_config(config: CountConfig) -> Result<Self, UrlCountError> {
        let fetcher = HttpFetcher::with_config(&config)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Create a counter on top of any [`Fetch`] implementation.
    pub fn with_fetcher(
        config: CountConfig,
        fetcher: Arc<dyn Fetch>,
    ) -> Result<Self, UrlCountError> {
        if config.pattern.is_empty() {
            return Err(UrlCountError::config("pattern cannot be empty"));
        }

        Ok(Self {
            gate: AdmissionGate::new(config.concurrency),
            pattern: Arc::from(config.pattern.as_str()),
            reporter: Arc::new(NoopReporter),
            fetcher,
            config,
        })
    }

    /// Send per-URL outcomes to `reporter`.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Get the configuration for this counter.
    pub fn config(&self) -> &CountConfig {
        &self.config
    }

    /// The admission gate bounding this counter's tasks.
    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Fetch a single raw line and count the pattern in its body.
    ///
    /// Runs inline, without taking an admission token and without
    /// reporting.
    pub async fn count_url(&self, line: &str) -> Result<UrlCount, UrlCountError> {
        self.task_context(Arc::new(Aggregator::new()))
            .fetch_and_count(trim_line_ending(line))
            .await
    }

    /// Process every line of `input` and return the final totals.
    ///
    /// For each line the loop first takes an admission token, then reads,
    /// then spawns a task that owns the token until it finishes. Reading
    /// the next line therefore only waits when every token is held. Once
    /// the input ends, the call waits for all launched tasks before
    /// reading the total.
    ///
    /// # Errors
    ///
    /// Returns `UrlCountError::Input` when reading `input` fails and
    /// `UrlCountError::Internal` when a processing task panicked. Per-URL
    /// parse and fetch failures never surface here; those URLs are dropped.
    pub async fn run<R>(&self, mut input: R) -> Result<RunSummary, UrlCountError>
    where
        R: AsyncBufRead + Unpin,
    {
        let aggregator = Arc::new(Aggregator::new());
        let barrier = CompletionBarrier::new();
        let ctx = self.task_context(Arc::clone(&aggregator));

        let mut tasks = JoinSet::new();
        let mut dispatched = 0u64;
        let mut buf = Vec::new();

        loop {
            // Reap finished tasks so the set stays bounded by the gate.
            while let Some(joined) = tasks.try_join_next() {
                joined.map_err(task_failed)?;
            }

            let token = self.gate.acquire().await?;

            buf.clear();
            let read = input
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|e| UrlCountError::input(e.to_string()))?;
            if read == 0 {
                token.release();
                break;
            }

            let line = trim_line_ending(&String::from_utf8_lossy(&buf)).to_string();
            let slot = TaskSlot {
                token,
                completion: barrier.register(),
            };
            dispatched += 1;

            tracing::trace!(line = %line, held = self.gate.held(), "dispatching");
            tasks.spawn(ctx.clone().process(line, slot));
        }

        barrier.wait().await;
        while let Some(joined) = tasks.join_next().await {
            joined.map_err(task_failed)?;
        }

        let counted = aggregator.contributions();
        let summary = RunSummary {
            total: aggregator.total(),
            dispatched,
            counted,
            dropped: dispatched - counted,
        };
        tracing::info!(
            total = summary.total,
            dispatched = summary.dispatched,
            counted = summary.counted,
            dropped = summary.dropped,
            "run finished"
        );
        Ok(summary)
    }

    fn task_context(&self, aggregator: Arc<Aggregator>) -> TaskContext {
        TaskContext {
            fetcher: Arc::clone(&self.fetcher),
            reporter: Arc::clone(&self.reporter),
            aggregator,
            pattern: Arc::clone(&self.pattern),
            timeout: self.config.timeout,
        }
    }
}

fn task_failed(err: JoinError) -> UrlCountError {
    if err.is_panic() {
        UrlCountError::internal(format!("processing task panicked: {}", err))
    } else {
        UrlCountError::internal(format!("processing task failed: {}", err))
    }
}

/// What a processing task must give back when it ends.
///
/// Fields drop in declaration order, so on an unwinding exit the token is
/// released before completion is signalled, same as in [`TaskSlot::finish`].
struct TaskSlot {
    token: AdmissionToken,
    completion: CompletionGuard,
}

impl TaskSlot {
    fn finish(self) {
        let Self { token, completion } = self;
        token.release();
        completion.done();
    }
}

/// Shared handles cloned into every processing task.
#[derive(Clone)]
struct TaskContext {
    fetcher: Arc<dyn Fetch>,
    reporter: Arc<dyn Reporter>,
    aggregator: Arc<Aggregator>,
    pattern: Arc<str>,
    timeout: Option<Duration>,
}

impl TaskContext {
    /// Body of one processing task.
    async fn process(self, line: String, slot: TaskSlot) {
        match self.fetch_and_count(&line).await {
            Ok(result) => {
                tracing::debug!(
                    url = %result.url,
                    count = result.count,
                    elapsed_ms = result.elapsed.as_millis() as u64,
                    "counted"
                );
                self.reporter.url_counted(&result);
                self.aggregator.add(result.count);
            }
            Err(e) => {
                tracing::info!(line = %line, error = %e, "dropping URL");
                self.reporter.url_dropped(&line, &e);
            }
        }

        slot.finish();
    }

    async fn fetch_and_count(&self, line: &str) -> Result<UrlCount, UrlCountError> {
        let start = Instant::now();
        let url = parse_url(line)?;

        let body = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetcher.get(&url))
                .await
                .map_err(|_| UrlCountError::timeout(format!("GET {}", url), limit))??,
            None => self.fetcher.get(&url).await?,
        };

        let count = count_occurrences(&body, self.pattern.as_bytes());

        Ok(UrlCount {
            url: url.to_string(),
            count,
            elapsed: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CollectingReporter;
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::Url;
    use std::io;
    use std::sync::Mutex;

    /// Serves the same body for every URL.
    struct StaticFetcher(&'static str);

    #[async_trait]
    impl Fetch for StaticFetcher {
        async fn get(&self, _url: &Url) -> Result<Bytes, UrlCountError> {
            Ok(Bytes::from_static(self.0.as_bytes()))
        }
    }

    /// Never answers.
    struct HangingFetcher;

    #[async_trait]
    impl Fetch for HangingFetcher {
        async fn get(&self, _url: &Url) -> Result<Bytes, UrlCountError> {
            std::future::pending().await
        }
    }

    /// Panics while reporting one specific URL.
    struct PanickingReporter {
        target: &'static str,
        inner: CollectingReporter,
    }

    impl Reporter for PanickingReporter {
        fn url_counted(&self, result: &UrlCount) {
            if result.url == self.target {
                panic!("reporter failed on {}", result.url);
            }
            self.inner.url_counted(result);
        }
    }

    /// Records the gate and barrier state seen while a result is reported.
    struct SlotObserver {
        gate: AdmissionGate,
        barrier: CompletionBarrier,
        seen: Mutex<Vec<(usize, usize)>>,
    }

    impl Reporter for SlotObserver {
        fn url_counted(&self, _result: &UrlCount) {
            self.seen
                .lock()
                .unwrap()
                .push((self.gate.held(), self.barrier.pending()));
        }
    }

    fn counter_with(fetcher: Arc<dyn Fetch>) -> (UrlCounter, Arc<CollectingReporter>) {
        let reporter = Arc::new(CollectingReporter::new());
        let counter = UrlCounter::with_fetcher(CountConfig::default(), fetcher)
            .unwrap()
            .with_reporter(reporter.clone());
        (counter, reporter)
    }

    #[tokio::test]
    async fn test_empty_input() {
        let (counter, reporter) = counter_with(Arc::new(StaticFetcher("Go")));
        let input: &[u8] = b"";

        let summary = counter.run(input).await.unwrap();
        assert_eq!(summary, RunSummary::default());
        assert!(reporter.counted().is_empty());
        assert_eq!(counter.gate().held(), 0);
    }

    #[tokio::test]
    async fn test_last_line_without_newline_is_processed() {
        let (counter, reporter) = counter_with(Arc::new(StaticFetcher("GoGo")));
        let input: &[u8] = b"https://a.test/\r\nhttps://b.test/";

        let summary = counter.run(input).await.unwrap();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.dispatched, 2);
        assert_eq!(reporter.counted().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_and_garbage_lines_are_dropped() {
        let (counter, reporter) = counter_with(Arc::new(StaticFetcher("Go")));
        let input: &[u8] = b"\nnot a url\n\xff\xfe\nhttps://a.test/\n";

        let summary = counter.run(input).await.unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.dispatched, 4);
        assert_eq!(summary.counted, 1);
        assert_eq!(summary.dropped, 3);
        assert_eq!(reporter.dropped().len(), 3);
        assert_eq!(counter.gate().held(), 0);
    }

    #[tokio::test]
    async fn test_read_error_is_fatal() {
        let (counter, _reporter) = counter_with(Arc::new(StaticFetcher("Go")));
        let input = tokio_test::io::Builder::new()
            .read(b"https://a.test/\n")
            .read_error(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
            .build();

        let err = counter
            .run(tokio::io::BufReader::new(input))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("pipe closed"));
    }

    #[tokio::test]
    async fn test_timeout_drops_url_and_frees_slot() {
        let config = CountConfig::default()
            .with_concurrency(1)
            .with_timeout(Duration::from_millis(20));
        let reporter = Arc::new(CollectingReporter::new());
        let counter = UrlCounter::with_fetcher(config, Arc::new(HangingFetcher))
            .unwrap()
            .with_reporter(reporter.clone());
        let input: &[u8] = b"https://a.test/\nhttps://b.test/\n";

        let summary = tokio::time::timeout(Duration::from_secs(5), counter.run(input))
            .await
            .expect("timed out fetches must release their slot")
            .unwrap();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.dropped, 2);
        assert_eq!(reporter.dropped().len(), 2);
        assert_eq!(counter.gate().held(), 0);
    }

    #[tokio::test]
    async fn test_count_url() {
        let (counter, reporter) = counter_with(Arc::new(StaticFetcher("Go, Go, Gopher")));

        let result = counter.count_url("https://example.test\n").await.unwrap();
        assert_eq!(result.url, "https://example.test/");
        assert_eq!(result.count, 3);
        // Inline checks are not reported
        assert!(reporter.counted().is_empty());

        assert!(counter.count_url("not a url").await.is_err());
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let config = CountConfig::default().with_pattern("");
        let result = UrlCounter::with_fetcher(config, Arc::new(StaticFetcher("")));
        assert!(matches!(result, Err(UrlCountError::ConfigError { .. })));
    }

    #[tokio::test]
    async fn test_panicking_task_fails_the_run() {
        let reporter = Arc::new(PanickingReporter {
            target: "https://b.test/",
            inner: CollectingReporter::new(),
        });
        let counter = UrlCounter::with_fetcher(
            CountConfig::default(),
            Arc::new(StaticFetcher("GoGo")),
        )
        .unwrap()
        .with_reporter(reporter.clone());
        let input: &[u8] = b"https://a.test/\nhttps://b.test/\n";

        let err = counter.run(input).await.unwrap_err();
        assert!(matches!(err, UrlCountError::Internal { .. }));
        assert!(err.to_string().contains("panicked"));
        assert_eq!(counter.gate().held(), 0);
    }

    #[tokio::test]
    async fn test_task_holds_slot_until_reported_and_added() {
        let gate = AdmissionGate::new(1);
        let barrier = CompletionBarrier::new();
        let observer = Arc::new(SlotObserver {
            gate: gate.clone(),
            barrier: barrier.clone(),
            seen: Mutex::new(Vec::new()),
        });
        let aggregator = Arc::new(Aggregator::new());
        let ctx = TaskContext {
            fetcher: Arc::new(StaticFetcher("GoGo")),
            reporter: observer.clone(),
            aggregator: Arc::clone(&aggregator),
            pattern: Arc::from("Go"),
            timeout: None,
        };

        let slot = TaskSlot {
            token: gate.acquire().await.unwrap(),
            completion: barrier.register(),
        };

        // Whoever gets the token next must already see the count
        let next_gate = gate.clone();
        let next_aggregator = Arc::clone(&aggregator);
        let waiter = tokio::spawn(async move {
            let token = next_gate.acquire().await.unwrap();
            let total = next_aggregator.total();
            token.release();
            total
        });

        tokio::spawn(ctx.process("https://a.test/".to_string(), slot))
            .await
            .unwrap();
        barrier.wait().await;

        assert_eq!(waiter.await.unwrap(), 2);
        assert_eq!(*observer.seen.lock().unwrap(), vec![(1, 1)]);
        assert_eq!(gate.held(), 0);
        assert_eq!(barrier.pending(), 0);
    }
}
