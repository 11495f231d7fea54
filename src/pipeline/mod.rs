//! Thread-per-station clip pipeline.
//!
//! ```text
//! source → Landmarks → Sequencer → Recognizer → Correction → sink
//! ```

pub mod error;
pub mod landmark_station;
pub mod orchestrator;
pub mod recognizer_station;
pub mod sequence_station;
pub mod sink;
pub mod station;
pub mod types;

pub use error::{CountingReporter, ErrorReporter, LogReporter, StationError};
pub use landmark_station::LandmarkStation;
pub use orchestrator::{Pipeline, PipelineConfig, PipelineSummary};
pub use recognizer_station::RecognizerStation;
pub use sequence_station::SequenceStation;
pub use sink::{CollectorSink, SinkReport, StdoutSink, TextSink, format_line};
pub use station::{Station, StationRunner, StationStats};
pub use types::{ClipFrames, ClipInput, ClipText, LandmarkSequence};
