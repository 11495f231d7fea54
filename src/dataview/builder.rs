use crate::dataview::example::Example;
use crate::dataview::raw::{RawClip, discover_clips};
use crate::error::Result;
use crate::exec::CommandExecutor;
use crate::video::{FrameExtractor, load_frames};
use crate::vision::FaceTracker;
use crate::workspace::{DatasetTier, Workspace};
use std::path::PathBuf;

/// Outcome of building one tier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildSummary {
    pub built: Vec<PathBuf>,
    pub skipped: usize,
    pub failed: Vec<(String, String)>,
}

/// Turns raw clips into dataview examples.
pub struct DataviewBuilder<E: CommandExecutor> {
    extractor: FrameExtractor<E>,
    tracker: FaceTracker,
    overwrite: bool,
}

impl<E: CommandExecutor> DataviewBuilder<E> {
    pub fn new(extractor: FrameExtractor<E>, tracker: FaceTracker) -> Self {
        Self {
            extractor,
            tracker,
            overwrite: false,
        }
    }

    /// Rebuild examples that already exist.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Frames are cached next to the video and reused on later builds at
    /// the same frame rate.
    pub fn build_clip(&mut self, clip: &RawClip) -> Result<Example> {
        let transcript = clip.transcript()?;
        let frames_dir = clip.frames_dir();
        self.extractor.extract_cached(&clip.video, &frames_dir)?;
        let frames = load_frames(&frames_dir, self.extractor.fps())?;
        let tracked = self
            .tracker
            .track_all(&frames, &format!("{}/{}", clip.tier, clip.id))?;
        Ok(Example::from_tracked(
            clip.id.clone(),
            transcript,
            self.extractor.fps(),
            tracked,
        ))
    }

    /// Build every clip of `tier` into `datasets/<clip tier>/`.
    ///
    /// Per-clip failures are collected rather than aborting the tier.
    pub fn build_tier(&mut self, workspace: &Workspace, tier: DatasetTier) -> Result<BuildSummary> {
        let mut summary = BuildSummary::default();
        for clip in discover_clips(workspace, tier)? {
            let out_dir = workspace.dataview_dir(clip.tier);
            let target = out_dir.join(format!("{}.json", clip.id));
            if target.exists() && !self.overwrite {
                summary.skipped += 1;
                continue;
            }
            match self.build_clip(&clip) {
                Ok(example) => {
                    let path = example.save(&out_dir)?;
                    tracing::info!(clip = %clip.id, frames = example.num_frames(), "built example");
                    summary.built.push(path);
                }
                Err(e) => {
                    tracing::warn!(clip = %clip.id, error = %e, "failed to build example");
                    summary.failed.push((clip.id.clone(), e.to_string()));
                }
            }
        }
        Ok(summary)
    }
}
