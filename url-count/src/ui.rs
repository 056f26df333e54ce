//! Terminal output for the url-count CLI.
//!
//! Report lines go to stdout; diagnostics go to stderr, styled with the
//! `console` crate when stderr is a terminal.

use console::style;
use std::io::{self, Write};
use url_count_lib::{format_count_line, format_total_line, Reporter, UrlCount};

/// Prints one line per counted URL as soon as its task finishes.
///
/// Each line is written while holding the stdout lock, so lines from
/// concurrent tasks never mix.
pub struct StdoutReporter {
    pattern: String,
}

impl StdoutReporter {
    pub fn new<P: Into<String>>(pattern: P) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl Reporter for StdoutReporter {
    fn url_counted(&self, result: &UrlCount) {
        let line = format_count_line(&self.pattern, result);
        if let Err(e) = write_line(&mut io::stdout().lock(), &line) {
            tracing::warn!(error = %e, "failed to write report line");
        }
    }
}

/// Print the final total line.
pub fn print_total(total: u64) -> io::Result<()> {
    write_line(&mut io::stdout().lock(), &format_total_line(total))
}

/// Print a fatal error to stderr.
pub fn print_error(error: &dyn std::fmt::Display) {
    eprintln!("{} {}", style("Error:").for_stderr().red().bold(), error);
}

/// Write one line and flush it.
///
/// A closed reader (`url-count | head -1`) is not an error: the remaining
/// output is simply discarded.
fn write_line<W: Write>(out: &mut W, line: &str) -> io::Result<()> {
    match writeln!(out, "{}", line).and_then(|()| out.flush()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            tracing::debug!("stdout closed, discarding output");
            Ok(())
        }
        other => other,
    }
}
