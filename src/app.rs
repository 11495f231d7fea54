//! Lip reading application entry points.
//!
//! Wires configuration and workspace into the vision, model, correction
//! and pipeline layers:
//! video → frames → face tracker → sequence model → corrector → output

use crate::config::{Config, LandmarkBackend};
use crate::correction::{ChainCorrector, Corrector, build_corrector};
use crate::dataview::{DataviewBuilder, Example, TierStats, load_tier, tier_stats};
use crate::defaults;
use crate::error::{LipreadError, Result};
use crate::evaluate::{EvaluationReport, evaluate_examples};
use crate::exec::SystemCommandExecutor;
use crate::model::LipReader;
use crate::output::TerminalSink;
use crate::pipeline::{ClipFrames, ClipInput, Pipeline, PipelineConfig, PipelineSummary};
use crate::video::{FrameExtractor, load_frames};
use crate::vision::{
    CandleLandmarkPredictor, FaceTracker, LandmarkPredictor, Landmarks, MeanShapePredictor,
    RustfaceDetector, TrackedFrame,
};
use crate::workspace::{DatasetTier, Workspace};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Load the configuration file (or defaults), then apply environment
/// overrides and the command-line flags.
pub fn load_config(
    custom_path: Option<&Path>,
    overrides: &crate::cli::ConfigOverrides,
) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path())?,
    };
    let mut config = config.with_env_overrides()?;
    overrides.apply(&mut config);
    Ok(config)
}

fn frame_extractor(config: &Config) -> FrameExtractor<SystemCommandExecutor> {
    FrameExtractor::new(SystemCommandExecutor::new(), config.video.fps)
        .with_ffmpeg(config.video.ffmpeg.clone())
}

/// Face detector plus the configured landmark predictor.
pub fn build_tracker(config: &Config, workspace: &Workspace) -> Result<FaceTracker> {
    let face_model =
        workspace.weights_file(config.vision.face_model.as_deref(), defaults::FACE_MODEL_FILE);
    let detector = RustfaceDetector::from_file(&face_model, config.vision.min_face_size)?;

    let predictor: Box<dyn LandmarkPredictor> = match config.vision.landmarks {
        LandmarkBackend::MeanShape => Box::new(MeanShapePredictor::new()),
        LandmarkBackend::Regressor => {
            let path = workspace.weights_file(
                config.vision.landmark_model.as_deref(),
                defaults::LANDMARK_MODEL_FILE,
            );
            Box::new(CandleLandmarkPredictor::load(&path)?)
        }
    };
    Ok(FaceTracker::new(Box::new(detector), predictor))
}

/// Sequence model sized for the configured landmark features.
pub fn build_recognizer(config: &Config, workspace: &Workspace) -> Result<LipReader> {
    let weights =
        workspace.weights_file(config.model.weights.as_deref(), defaults::LIPREADER_MODEL_FILE);
    let frame_dim = Landmarks::feature_dim(config.vision.mouth_only);
    LipReader::load(&weights, &config.model, config.decode.clone(), frame_dim)
}

/// Create the workspace directories. Returns the workspace root.
pub fn run_init(config: &Config) -> Result<PathBuf> {
    let workspace = Workspace::resolve(config)?;
    workspace.ensure_layout()?;
    Ok(workspace.root().to_path_buf())
}

/// Default frame directory for a video: `<stem>_frames` beside it.
pub fn default_frames_dir(video: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    video.with_file_name(format!("{stem}_frames"))
}

/// Extract a video's frames. Returns the written frame files.
pub fn run_frames(config: &Config, video: &Path, out: Option<&Path>) -> Result<Vec<PathBuf>> {
    let out_dir = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_frames_dir(video));
    frame_extractor(config).extract(video, &out_dir)
}

/// Directory holding the frames of `input`, extracting them from a video
/// when they are not already cached.
fn frames_for_input(config: &Config, input: &Path) -> Result<PathBuf> {
    if input.is_dir() {
        return Ok(input.to_path_buf());
    }
    if !input.is_file() {
        return Err(LipreadError::FrameExtraction {
            message: format!("{} is neither a video nor a frame directory", input.display()),
        });
    }
    let dir = default_frames_dir(input);
    frame_extractor(config).extract_cached(input, &dir)?;
    Ok(dir)
}

/// Clip id for an input path: the video stem or the frame directory name.
fn clip_id(input: &Path) -> String {
    let name = if input.is_dir() {
        input.file_name()
    } else {
        input.file_stem()
    };
    name.map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}

/// Track face and landmarks over every frame of one clip.
///
/// With `out`, the sequence is also written as a dataview example
/// (without a transcript) into that directory.
pub fn run_landmarks(
    config: &Config,
    input: &Path,
    out: Option<&Path>,
) -> Result<(Vec<TrackedFrame>, Option<PathBuf>)> {
    let workspace = Workspace::resolve(config)?;
    let frames_dir = frames_for_input(config, input)?;
    let frames = load_frames(&frames_dir, config.video.fps)?;
    let mut tracker = build_tracker(config, &workspace)?;
    let id = clip_id(input);
    let tracked = tracker.track_all(&frames, &id)?;

    let saved = match out {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let example = Example::from_tracked(id, "", config.video.fps, tracked.clone());
            Some(example.save(dir)?)
        }
        None => None,
    };
    Ok((tracked, saved))
}

/// Build dataview examples for every raw clip of `tier`.
pub fn run_dataview_build(
    config: &Config,
    tier: DatasetTier,
    overwrite: bool,
) -> Result<crate::dataview::BuildSummary> {
    let workspace = Workspace::resolve(config)?;
    workspace.ensure_layout()?;
    let tracker = build_tracker(config, &workspace)?;
    DataviewBuilder::new(frame_extractor(config), tracker)
        .overwrite(overwrite)
        .build_tier(&workspace, tier)
}

pub fn run_dataview_list(config: &Config) -> Result<Vec<TierStats>> {
    tier_stats(&Workspace::resolve(config)?)
}

fn corrector_for(config: &Config, workspace: &Workspace, enabled: bool) -> Result<ChainCorrector> {
    if !enabled {
        return Ok(ChainCorrector::new(Vec::new()));
    }
    build_corrector(&config.correction, workspace)
}

/// Read the lips in each input and print one line per clip.
pub fn run_transcribe(
    config: &Config,
    inputs: &[PathBuf],
    no_correction: bool,
    show_ids: bool,
    color: bool,
) -> Result<PipelineSummary> {
    let workspace = Workspace::resolve(config)?;
    let tracker = build_tracker(config, &workspace)?;
    let recognizer = Arc::new(build_recognizer(config, &workspace)?);
    let correction_enabled = !no_correction && config.correction.enabled;
    let corrector = corrector_for(config, &workspace, correction_enabled)?;

    let mut clips = Vec::with_capacity(inputs.len());
    for input in inputs {
        match frames_for_input(config, input) {
            Ok(dir) => clips.push(ClipInput::new(
                clip_id(input),
                config.video.fps,
                ClipFrames::Directory(dir),
            )),
            Err(e) => tracing::error!(input = %input.display(), "skipping: {e}"),
        }
    }

    let pipeline = Pipeline::new(PipelineConfig {
        mouth_only: config.vision.mouth_only,
        correction_enabled,
        ..PipelineConfig::default()
    });
    pipeline.run(
        clips,
        tracker,
        recognizer,
        Box::new(corrector),
        Box::new(TerminalSink::new(show_ids, color)),
    )
}

/// Score the configured recognizer over a dataview tier.
pub fn run_evaluate(config: &Config, tier: DatasetTier, no_correction: bool) -> Result<EvaluationReport> {
    let workspace = Workspace::resolve(config)?;
    let examples = load_tier(&workspace, tier)?;
    if examples.is_empty() {
        return Err(LipreadError::Dataview {
            message: format!("no examples for tier {tier}; run `lipread dataview build --tier {tier}`"),
        });
    }
    let recognizer = build_recognizer(config, &workspace)?;
    let correction_enabled = !no_correction && config.correction.enabled;
    let mut corrector = corrector_for(config, &workspace, correction_enabled)?;
    let corrector: Option<&mut dyn Corrector> = if corrector.is_empty() {
        None
    } else {
        Some(&mut corrector)
    };
    Ok(evaluate_examples(
        &examples,
        &recognizer,
        corrector,
        config.vision.mouth_only,
    ))
}
