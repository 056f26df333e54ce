//! Error handling for URL counting operations.
//!
//! This module defines a single error type that covers every way a run can
//! fail, from a broken input pipe to a single unreachable URL.

use std::fmt;
use std::time::Duration;

/// Main error type for URL counting operations.
///
/// Only [`UrlCountError::Input`] is fatal for a run. Every other variant is
/// raised inside one processing task and ends only that task.
#[derive(Debug, Clone)]
pub enum UrlCountError {
    /// The line could not be parsed as an absolute URL
    InvalidUrl {
        input: String,
        reason: String,
    },

    /// Network-related errors (connection, body read, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// A fetch did not finish within the configured timeout
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Reading the input stream failed for a reason other than end-of-input
    Input {
        message: String,
    },

    /// Configuration errors (invalid settings, unparsable TOML, etc.)
    ConfigError {
        message: String,
    },

    /// File I/O errors when reading config files or URL lists
    FileError {
        path: String,
        message: String,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl UrlCountError {
    /// Create a new invalid URL error.
    pub fn invalid_url<I: Into<String>, R: Into<String>>(input: I, reason: R) -> Self {
        Self::InvalidUrl {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new input stream error.
    pub fn input<M: Into<String>>(message: M) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error ends the whole run rather than a single URL.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Input { .. })
    }
}

impl fmt::Display for UrlCountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { input, reason } => {
                write!(f, "Invalid URL '{}': {}", input, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::Input { message } => {
                write!(f, "Input error: {}", message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for UrlCountError {}

impl From<reqwest::Error> for UrlCountError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("HTTP request timed out", err.to_string())
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::network_with_source("Failed to read response body", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}
