//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files, reading
//! `UC_*` environment variables, and merging file configurations with
//! proper precedence rules.

use crate::error::UrlCountError;
use crate::types::MAX_CONCURRENCY;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// Default concurrency level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Default pattern to count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Per-fetch timeout (as string, e.g., "5s", "30s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Idle connection timeout (as string, e.g., "10s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<String>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to emit warnings for config issues
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or unreadable, is not valid TOML, or
    /// holds out-of-range values.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, UrlCountError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(UrlCountError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            UrlCountError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            UrlCountError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config first, then `~/.url-count.toml`, then the current
    /// directory; later files override earlier ones field by field. Files
    /// that fail to load are skipped.
    pub fn discover_and_load(&self) -> Result<FileConfig, UrlCountError> {
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping config file");
                }
            }
        }

        if self.verbose && loaded_files.len() > 1 {
            tracing::info!(
                files = ?loaded_files,
                "multiple config files found, later files take precedence"
            );
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        local_config_in(Path::new("."))
    }

    /// Get the global configuration file path in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let path = Path::new(&home).join(".url-count.toml");
        path.exists().then_some(path)
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("url-count").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    concurrency: higher_defaults.concurrency.or(lower_defaults.concurrency),
                    pattern: higher_defaults.pattern.or(lower_defaults.pattern),
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    idle_timeout: higher_defaults.idle_timeout.or(lower_defaults.idle_timeout),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), UrlCountError> {
        let Some(defaults) = &config.defaults else {
            return Ok(());
        };

        if let Some(concurrency) = defaults.concurrency {
            if concurrency == 0 || concurrency > MAX_CONCURRENCY {
                return Err(UrlCountError::config(format!(
                    "Concurrency must be between 1 and {}",
                    MAX_CONCURRENCY
                )));
            }
        }

        if let Some(pattern) = &defaults.pattern {
            if pattern.is_empty() {
                return Err(UrlCountError::config("Pattern cannot be empty"));
            }
        }

        for (key, value) in [
            ("timeout", &defaults.timeout),
            ("idle_timeout", &defaults.idle_timeout),
        ] {
            if let Some(value) = value {
                if parse_duration(value).is_none() {
                    return Err(UrlCountError::config(format!(
                        "Invalid {} format '{}'. Use format like '500ms', '5s', '2m'",
                        key, value
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// Values come from `UC_*` variables; invalid ones are left as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub pattern: Option<String>,
    pub timeout: Option<Duration>,
    pub idle_timeout: Option<Duration>,
    pub file: Option<String>,
    pub config: Option<String>,
}

/// Load configuration from the process environment.
///
/// Reads `UC_CONCURRENCY`, `UC_PATTERN`, `UC_TIMEOUT`, `UC_IDLE_TIMEOUT`,
/// `UC_FILE` and `UC_CONFIG`. Invalid values are logged as warnings and
/// ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Same as [`load_env_config`] with an injectable variable lookup.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("UC_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if (1..=MAX_CONCURRENCY).contains(&concurrency) => {
                tracing::debug!(concurrency, "using UC_CONCURRENCY");
                env_config.concurrency = Some(concurrency);
            }
            _ => {
                tracing::warn!(
                    value = %val,
                    "invalid UC_CONCURRENCY, must be 1-{}",
                    MAX_CONCURRENCY
                );
            }
        }
    }

    if let Some(pattern) = lookup("UC_PATTERN") {
        if pattern.is_empty() {
            tracing::warn!("ignoring empty UC_PATTERN");
        } else {
            tracing::debug!(pattern = %pattern, "using UC_PATTERN");
            env_config.pattern = Some(pattern);
        }
    }

    for (key, slot) in [
        ("UC_TIMEOUT", &mut env_config.timeout),
        ("UC_IDLE_TIMEOUT", &mut env_config.idle_timeout),
    ] {
        if let Some(val) = lookup(key) {
            match parse_duration(&val) {
                Some(duration) => {
                    tracing::debug!(?duration, "using {}", key);
                    *slot = Some(duration);
                }
                None => {
                    tracing::warn!(
                        value = %val,
                        "invalid {}, use format like '500ms', '5s', '2m'",
                        key
                    );
                }
            }
        }
    }

    env_config.file = lookup("UC_FILE").filter(|path| !path.is_empty());
    env_config.config = lookup("UC_CONFIG").filter(|path| !path.is_empty());

    env_config
}

/// The hidden `.url-count.toml` in `dir`, if present.
fn local_config_in(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(".url-count.toml");
    path.exists().then_some(path)
}

/// Parse a duration string like "500ms", "5s", "2m" or a bare number of
/// seconds.
///
/// Zero and values too large to represent are rejected.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim().to_lowercase();

    let duration = if let Some(ms) = input.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = input.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = input.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        // Assume seconds if no unit
        input.parse::<u64>().ok().map(Duration::from_secs)
    }?;

    (!duration.is_zero()).then_some(duration)
}
