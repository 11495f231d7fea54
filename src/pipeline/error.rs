//! Error types and reporting for pipeline stations.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Errors that can occur during station processing.
#[derive(Debug, Clone)]
pub enum StationError {
    /// The current item is dropped; the station keeps running.
    Recoverable(String),
    /// The station shuts down.
    Fatal(String),
}

impl fmt::Display for StationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationError::Recoverable(msg) => write!(f, "Recoverable error: {}", msg),
            StationError::Fatal(msg) => write!(f, "Fatal error: {}", msg),
        }
    }
}

impl std::error::Error for StationError {}

impl From<crate::error::LipreadError> for StationError {
    fn from(e: crate::error::LipreadError) -> Self {
        StationError::Recoverable(e.to_string())
    }
}

/// Trait for reporting station errors.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, station: &str, error: &StationError);
}

/// Reports through `tracing`: recoverable errors as warnings, fatal ones as errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, station: &str, error: &StationError) {
        match error {
            StationError::Recoverable(msg) => tracing::warn!(station, "{msg}"),
            StationError::Fatal(msg) => tracing::error!(station, "{msg}"),
        }
    }
}

/// Logs like [`LogReporter`] and counts what it saw.
#[derive(Debug, Default)]
pub struct CountingReporter {
    recoverable: AtomicUsize,
    fatal: AtomicUsize,
}

impl CountingReporter {
    pub fn recoverable(&self) -> usize {
        self.recoverable.load(Ordering::SeqCst)
    }

    pub fn fatal(&self) -> usize {
        self.fatal.load(Ordering::SeqCst)
    }
}

impl ErrorReporter for CountingReporter {
    fn report(&self, station: &str, error: &StationError) {
        match error {
            StationError::Recoverable(_) => self.recoverable.fetch_add(1, Ordering::SeqCst),
            StationError::Fatal(_) => self.fatal.fetch_add(1, Ordering::SeqCst),
        };
        LogReporter.report(station, error);
    }
}
