//! # Diagnostics
//!
//! Every component of the pipeline reports through a [`Reporter`] instead of
//! returning errors across component boundaries. Failures stay local: a file
//! that fails to parse is reported and skipped, a folder that fails to
//! generate is reported and skipped, and only the top-level caller sees a
//! plain success/failure outcome.
//!
//! Two reporters ship with the crate:
//!
//! - [`TracingReporter`] - forwards to `tracing` (the default for the CLI)
//! - [`RecordingReporter`] - keeps every diagnostic in order so callers and
//!   tests can inspect the exact messages that were produced
//!
//! ```rust
//! use autoapi::diagnostics::{RecordingReporter, Reporter, Severity};
//!
//! let reporter = RecordingReporter::new();
//! reporter.error("No endpoints found to map for ./api");
//! assert!(reporter.contains(Severity::Error, "No endpoints found"));
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};

/// Severity of a reported diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation that produced it did not complete
    Error,
    /// The operation completed using a fallback
    Warning,
    /// Progress information
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single message emitted by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Sink for diagnostics produced while scanning and generating
pub trait Reporter: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);

    fn error(&self, message: &str) {
        self.report(Diagnostic::new(Severity::Error, message));
    }

    fn warn(&self, message: &str) {
        self.report(Diagnostic::new(Severity::Warning, message));
    }

    fn info(&self, message: &str) {
        self.report(Diagnostic::new(Severity::Info, message));
    }
}

/// Shared handle passed down the pipeline
pub type SharedReporter = Arc<dyn Reporter>;

/// Reporter that emits each diagnostic as a `tracing` event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::error!("{}", diagnostic.message),
            Severity::Warning => tracing::warn!("{}", diagnostic.message),
            Severity::Info => tracing::info!("{}", diagnostic.message),
        }
    }
}

/// Reporter that records diagnostics in emission order
///
/// Recorded diagnostics are also forwarded to `tracing` at debug level so a
/// recording run still shows up in logs.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    entries: Mutex<Vec<Diagnostic>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Messages of the given severity, in order
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.diagnostics()
            .into_iter()
            .filter(|d| d.severity == severity)
            .map(|d| d.message)
            .collect()
    }

    /// Whether any diagnostic of `severity` contains `needle`
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.messages(severity).iter().any(|m| m.contains(needle))
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::debug!(severity = %diagnostic.severity, "{}", diagnostic.message);
        match self.entries.lock() {
            Ok(mut entries) => entries.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
