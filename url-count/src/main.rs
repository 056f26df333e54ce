//! URL Count CLI Application
//!
//! Reads URLs from stdin (or a file), fetches them with a bounded number of
//! requests in flight, and prints how often a pattern occurs in each body
//! followed by the total.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use std::process;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;
use url_count_lib::{
    load_env_config, parse_duration, ConfigManager, CountConfig, EnvConfig, FileConfig,
    UrlCountError, UrlCounter, MAX_CONCURRENCY,
};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for url-count
#[derive(Parser, Debug)]
#[command(name = "url-count")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Count a pattern in the bodies of URLs read from stdin")]
#[command(
    long_about = "Reads one URL per line from stdin, fetches each with a bounded number of concurrent requests, and prints how many times a pattern occurs in every response body, followed by the total.\n\nExample:\n  printf 'https://go.dev\\nhttps://go.dev\\n' | url-count"
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Read URLs from a file instead of stdin (one per line)
    #[arg(short = 'f', long = "file", value_name = "FILE", help_heading = "Input")]
    pub file: Option<String>,

    /// Literal, case-sensitive pattern to count (default: Go)
    #[arg(short = 'p', long = "pattern", value_name = "PATTERN", help_heading = "Input")]
    pub pattern: Option<String>,

    /// Max concurrent requests (default: 5, max: 100)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub concurrency: Option<usize>,

    /// Give up on a single URL after this long (e.g. 500ms, 5s, 2m)
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "DURATION",
        help_heading = "Performance"
    )]
    pub timeout: Option<String>,

    /// Close pooled connections idle for this long (default: 10s)
    #[arg(
        long = "idle-timeout",
        value_name = "DURATION",
        help_heading = "Performance"
    )]
    pub idle_timeout: Option<String>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show debug logs, including every URL counted
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Log progress and dropped URLs to stderr
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args);

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        ui::print_error(&e);
        process::exit(1);
    }

    if let Err(e) = run(args).await {
        ui::print_error(&e);
        process::exit(1);
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--debug` and `--verbose` pick the
/// level for this workspace's crates.
fn init_logging(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,url_count={0},url_count_lib={0}", level))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > MAX_CONCURRENCY {
            return Err(format!(
                "Concurrency must be between 1 and {}",
                MAX_CONCURRENCY
            ));
        }
    }

    if matches!(&args.pattern, Some(pattern) if pattern.is_empty()) {
        return Err("Pattern cannot be empty".to_string());
    }

    for (flag, value) in [
        ("--timeout", &args.timeout),
        ("--idle-timeout", &args.idle_timeout),
    ] {
        if let Some(value) = value {
            if parse_duration(value).is_none() {
                return Err(format!(
                    "Invalid {} '{}'. Use format like '500ms', '5s', '2m'",
                    flag, value
                ));
            }
        }
    }

    Ok(())
}

/// Main counting logic
async fn run(args: Args) -> Result<(), UrlCountError> {
    let env_config = load_env_config();
    let config = build_config(&args, &env_config)?;

    tracing::info!(
        concurrency = config.concurrency,
        pattern = %config.pattern,
        timeout = ?config.timeout,
        "starting"
    );

    let reporter = Arc::new(ui::StdoutReporter::new(config.pattern.clone()));
    let counter = UrlCounter::with_config(config)?.with_reporter(reporter);

    let input_file = args.file.clone().or(env_config.file);
    let summary = match input_file {
        Some(path) => {
            tracing::info!(path = %path, "reading URLs from file");
            let file = tokio::fs::File::open(&path)
                .await
                .map_err(|e| UrlCountError::file_error(&path, e.to_string()))?;
            counter.run(BufReader::new(file)).await?
        }
        None => counter.run(BufReader::new(tokio::io::stdin())).await?,
    };

    ui::print_total(summary.total)
        .map_err(|e| UrlCountError::file_error("<stdout>", e.to_string()))?;

    if summary.dropped > 0 {
        tracing::info!(dropped = summary.dropped, "some URLs could not be counted");
    }

    Ok(())
}

/// Build CountConfig from CLI arguments with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (UC_*)
/// 3. Explicit config file (--config / UC_CONFIG) or discovered config files
/// 4. Built-in defaults
fn build_config(args: &Args, env_config: &EnvConfig) -> Result<CountConfig, UrlCountError> {
    let config_manager = ConfigManager::new(args.verbose);

    let file_config = if let Some(path) = args.config.as_ref().or(env_config.config.as_ref()) {
        tracing::info!(path = %path, "using explicit config file");
        config_manager.load_file(path)?
    } else {
        config_manager.discover_and_load()?
    };

    let config = merge_file_config_into_count_config(CountConfig::default(), file_config);
    let config = apply_environment_config(config, env_config);
    Ok(apply_cli_args_to_config(config, args))
}

/// Merge FileConfig into CountConfig
fn merge_file_config_into_count_config(
    mut config: CountConfig,
    file_config: FileConfig,
) -> CountConfig {
    let Some(defaults) = file_config.defaults else {
        return config;
    };

    if let Some(concurrency) = defaults.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(pattern) = defaults.pattern {
        config = config.with_pattern(pattern);
    }
    // Formats were checked when the file was loaded
    if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_duration) {
        config = config.with_timeout(timeout);
    }
    if let Some(idle_timeout) = defaults.idle_timeout.as_deref().and_then(parse_duration) {
        config = config.with_idle_timeout(idle_timeout);
    }

    config
}

/// Apply already-validated UC_* environment values.
fn apply_environment_config(mut config: CountConfig, env_config: &EnvConfig) -> CountConfig {
    if let Some(concurrency) = env_config.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(pattern) = &env_config.pattern {
        config = config.with_pattern(pattern.clone());
    }
    if let Some(timeout) = env_config.timeout {
        config = config.with_timeout(timeout);
    }
    if let Some(idle_timeout) = env_config.idle_timeout {
        config = config.with_idle_timeout(idle_timeout);
    }
    config
}

/// Apply CLI arguments to config (highest precedence).
///
/// Only flags the user actually passed override earlier layers.
fn apply_cli_args_to_config(mut config: CountConfig, args: &Args) -> CountConfig {
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(pattern) = &args.pattern {
        config = config.with_pattern(pattern.clone());
    }
    if let Some(timeout) = args.timeout.as_deref().and_then(parse_duration) {
        config = config.with_timeout(timeout);
    }
    if let Some(idle_timeout) = args.idle_timeout.as_deref().and_then(parse_duration) {
        config = config.with_idle_timeout(idle_timeout);
    }
    config
}
