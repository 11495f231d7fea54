//! Clip pipeline: frames → landmarks → sequence → text → correction → sink.

use crate::correction::{CorrectionStation, Corrector};
use crate::defaults;
use crate::error::{LipreadError, Result};
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::landmark_station::LandmarkStation;
use crate::pipeline::recognizer_station::RecognizerStation;
use crate::pipeline::sequence_station::SequenceStation;
use crate::pipeline::sink::{SinkReport, SinkStation, TextSink};
use crate::pipeline::station::{StationRunner, StationStats};
use crate::pipeline::types::{ClipEnd, ClipFrames, ClipInput, FrameMessage};
use crate::recognize::Recognizer;
use crate::video::load_frames;
use crate::vision::FaceTracker;
use crossbeam_channel::{Sender, bounded};
use std::sync::Arc;
use std::time::Instant;

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Feed only the mouth landmarks to the recognizer.
    pub mouth_only: bool,
    pub correction_enabled: bool,
    /// Channel capacity for per-frame messages.
    pub frame_buffer: usize,
    /// Channel capacity for per-clip messages.
    pub clip_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mouth_only: false,
            correction_enabled: true,
            frame_buffer: defaults::FRAME_BUFFER,
            clip_buffer: defaults::CLIP_BUFFER,
        }
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineSummary {
    pub clips_sent: usize,
    /// Clips whose frames could not be loaded.
    pub clips_unreadable: usize,
    pub report: SinkReport,
    pub stations: Vec<(&'static str, StationStats)>,
}

impl PipelineSummary {
    /// Items dropped by recoverable errors across all stations.
    pub fn failures(&self) -> usize {
        self.clips_unreadable + self.stations.iter().map(|(_, s)| s.failed).sum::<usize>()
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    error_reporter: Arc<dyn ErrorReporter>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            error_reporter: Arc::new(LogReporter),
        }
    }

    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Run every clip through the stations and wait for the sink to drain.
    pub fn run(
        self,
        clips: Vec<ClipInput>,
        tracker: FaceTracker,
        recognizer: Arc<dyn Recognizer>,
        corrector: Box<dyn Corrector>,
        sink: Box<dyn TextSink>,
    ) -> Result<PipelineSummary> {
        let started = Instant::now();
        let (frame_tx, frame_rx) = bounded(self.config.frame_buffer);
        let (landmark_tx, landmark_rx) = bounded(self.config.frame_buffer);
        let (sequence_tx, sequence_rx) = bounded(self.config.clip_buffer);
        let (text_tx, text_rx) = bounded(self.config.clip_buffer);
        let (corrected_tx, corrected_rx) = bounded(self.config.clip_buffer);
        let (sink_out_tx, _sink_out_rx) = bounded::<()>(1);
        let (result_tx, result_rx) = bounded(1);

        let reporter = &self.error_reporter;
        let landmarks = StationRunner::spawn(
            LandmarkStation::new(tracker),
            frame_rx,
            landmark_tx,
            reporter.clone(),
        )?;
        let sequencer = StationRunner::spawn(
            SequenceStation::new(self.config.mouth_only),
            landmark_rx,
            sequence_tx,
            reporter.clone(),
        )?;
        let recognize = StationRunner::spawn(
            RecognizerStation::new(recognizer),
            sequence_rx,
            text_tx,
            reporter.clone(),
        )?;
        let correction = StationRunner::spawn(
            CorrectionStation::new(corrector, self.config.correction_enabled),
            text_rx,
            corrected_tx,
            reporter.clone(),
        )?;
        let sink = StationRunner::spawn(
            SinkStation::new(sink, result_tx),
            corrected_rx,
            sink_out_tx,
            reporter.clone(),
        )?;

        let (clips_sent, clips_unreadable) = feed_clips(clips, &frame_tx);
        drop(frame_tx);

        let mut stations = Vec::new();
        for (name, joined) in [
            (landmarks.name(), landmarks.join()),
            (sequencer.name(), sequencer.join()),
            (recognize.name(), recognize.join()),
            (correction.name(), correction.join()),
            (sink.name(), sink.join()),
        ] {
            let stats = joined.map_err(LipreadError::Other)?;
            stations.push((name, stats));
        }

        let report = result_rx.recv().unwrap_or_default();
        let summary = PipelineSummary {
            clips_sent,
            clips_unreadable,
            report,
            stations,
        };
        tracing::info!(
            clips = clips_sent,
            recognized = summary.report.clips.len(),
            failures = summary.failures(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline finished"
        );
        Ok(summary)
    }
}

/// Source side: stream each clip's frames followed by its end marker.
///
/// Returns (clips sent, clips skipped because their frames could not be read).
fn feed_clips(clips: Vec<ClipInput>, frame_tx: &Sender<FrameMessage>) -> (usize, usize) {
    let mut sent = 0;
    let mut unreadable = 0;
    for clip in clips {
        let frames = match clip.frames {
            ClipFrames::InMemory(frames) => frames,
            ClipFrames::Directory(dir) => match load_frames(&dir, clip.fps) {
                Ok(frames) => frames,
                Err(e) => {
                    tracing::warn!(clip = %clip.id, "cannot read frames: {e}");
                    unreadable += 1;
                    continue;
                }
            },
        };

        let clip_id: Arc<str> = Arc::from(clip.id.as_str());
        let count = frames.len();
        for frame in frames {
            let message = FrameMessage::Frame {
                clip_id: clip_id.clone(),
                frame,
            };
            if frame_tx.send(message).is_err() {
                tracing::error!("landmark station stopped, aborting");
                return (sent, unreadable);
            }
        }
        let end = FrameMessage::EndOfClip(ClipEnd {
            clip_id,
            reference: clip.reference,
            frames: count,
        });
        if frame_tx.send(end).is_err() {
            return (sent, unreadable);
        }
        sent += 1;
    }
    (sent, unreadable)
}
