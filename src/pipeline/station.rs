//! Station abstraction and runner: one named thread per station, bounded channels in between.

use crate::error::Result;
use crate::pipeline::error::{ErrorReporter, StationError};
use crossbeam_channel::{Receiver, Sender};
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A processing stage of the clip pipeline.
///
/// Stations run in their own threads and are connected by channels.
pub trait Station: Send + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Processes a single input item.
    ///
    /// Returns:
    /// - `Ok(Some(output))` to pass an item downstream
    /// - `Ok(None)` when the input was absorbed (buffered or filtered)
    /// - `Err(StationError)` when processing failed
    fn process(&mut self, input: Self::Input) -> std::result::Result<Option<Self::Output>, StationError>;

    /// Returns the name of this station for logging and error reporting.
    fn name(&self) -> &'static str;

    /// Called once the input channel closes or a fatal error stops the station.
    fn shutdown(&mut self) {}
}

/// What a station did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StationStats {
    pub received: usize,
    pub emitted: usize,
    pub failed: usize,
}

/// Runs a station in a dedicated thread.
pub struct StationRunner<S: Station> {
    handle: Option<JoinHandle<StationStats>>,
    station_name: &'static str,
    _phantom: PhantomData<S>,
}

impl<S: Station> StationRunner<S> {
    /// Spawns `station` on a thread named `lipread-<station>`.
    pub fn spawn(
        mut station: S,
        input_rx: Receiver<S::Input>,
        output_tx: Sender<S::Output>,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Self> {
        let station_name = station.name();
        let handle = thread::Builder::new()
            .name(format!("lipread-{}", station_name.to_lowercase()))
            .spawn(move || Self::run_station(&mut station, input_rx, output_tx, error_reporter))?;

        Ok(Self {
            handle: Some(handle),
            station_name,
            _phantom: PhantomData,
        })
    }

    fn run_station(
        station: &mut S,
        input_rx: Receiver<S::Input>,
        output_tx: Sender<S::Output>,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> StationStats {
        let station_name = station.name();
        let mut stats = StationStats::default();

        while let Ok(input) = input_rx.recv() {
            stats.received += 1;
            match station.process(input) {
                Ok(Some(output)) => {
                    if output_tx.send(output).is_err() {
                        tracing::debug!(station = station_name, "downstream closed");
                        break;
                    }
                    stats.emitted += 1;
                }
                Ok(None) => {}
                Err(error @ StationError::Recoverable(_)) => {
                    stats.failed += 1;
                    error_reporter.report(station_name, &error);
                }
                Err(error @ StationError::Fatal(_)) => {
                    stats.failed += 1;
                    error_reporter.report(station_name, &error);
                    break;
                }
            }
        }

        station.shutdown();
        tracing::debug!(
            station = station_name,
            received = stats.received,
            emitted = stats.emitted,
            failed = stats.failed,
            "station stopped"
        );
        stats
    }

    /// Waits for the station thread and returns its counters.
    pub fn join(mut self) -> std::result::Result<StationStats, String> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| format!("Station '{}' thread panicked", self.station_name)),
            None => Ok(StationStats::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.station_name
    }
}
