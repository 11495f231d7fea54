//! Collected clips under `raw/<tier>/<clip>/`.

use crate::error::{LipreadError, Result};
use crate::workspace::{DatasetTier, Workspace};
use std::path::{Path, PathBuf};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm", "mpg"];
pub const TRANSCRIPT_FILE: &str = "transcript.txt";
/// Subdirectory of a clip that caches its extracted frames.
pub const FRAMES_DIR: &str = "frames";

/// A raw clip: one video with its transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct RawClip {
    pub id: String,
    pub tier: DatasetTier,
    pub dir: PathBuf,
    pub video: PathBuf,
}

impl RawClip {
    /// Inspect a clip directory. Returns `None` when it holds no video.
    pub fn from_dir(tier: DatasetTier, dir: &Path) -> Option<Self> {
        let id = dir.file_name()?.to_str()?.to_string();
        let video = find_video(dir)?;
        Some(Self {
            id,
            tier,
            dir: dir.to_path_buf(),
            video,
        })
    }

    /// Ground-truth transcript, whitespace-normalized and lowercased.
    pub fn transcript(&self) -> Result<String> {
        let path = self.dir.join(TRANSCRIPT_FILE);
        let raw = std::fs::read_to_string(&path).map_err(|e| LipreadError::Dataview {
            message: format!("cannot read transcript {}: {e}", path.display()),
        })?;
        Ok(raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.dir.join(FRAMES_DIR)
    }
}

fn find_video(dir: &Path) -> Option<PathBuf> {
    let mut videos: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    videos.sort();
    videos.into_iter().next()
}

/// All clips of `tier`, sorted by id. `all` spans every collected tier.
pub fn discover_clips(workspace: &Workspace, tier: DatasetTier) -> Result<Vec<RawClip>> {
    let mut clips = Vec::new();
    for member in tier.members() {
        let dir = workspace.raw_tier_dir(member);
        if !dir.is_dir() {
            continue;
        }
        let mut found: Vec<RawClip> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .filter_map(|p| {
                let clip = RawClip::from_dir(member, &p);
                if clip.is_none() {
                    tracing::debug!(dir = %p.display(), "skipping directory without video");
                }
                clip
            })
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        clips.extend(found);
    }
    Ok(clips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn add_clip(ws: &Workspace, tier: DatasetTier, id: &str, transcript: &str) {
        let dir = ws.raw_tier_dir(tier).join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("video.mp4"), b"not really a video").unwrap();
        std::fs::write(dir.join(TRANSCRIPT_FILE), transcript).unwrap();
    }

    #[test]
    fn discovers_clips_with_videos_only() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        ws.ensure_layout().unwrap();
        add_clip(&ws, DatasetTier::Nano, "b", "two");
        add_clip(&ws, DatasetTier::Nano, "a", "one");
        std::fs::create_dir_all(ws.raw_tier_dir(DatasetTier::Nano).join("empty")).unwrap();

        let clips = discover_clips(&ws, DatasetTier::Nano).unwrap();
        let ids: Vec<_> = clips.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(clips[0].video.ends_with("video.mp4"));
    }

    #[test]
    fn tier_all_spans_every_tier() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        ws.ensure_layout().unwrap();
        add_clip(&ws, DatasetTier::Nano, "n1", "x");
        add_clip(&ws, DatasetTier::Large, "l1", "y");

        let clips = discover_clips(&ws, DatasetTier::All).unwrap();
        assert_eq!(clips.len(), 2);
        assert_eq!(clips[0].tier, DatasetTier::Nano);
        assert_eq!(clips[1].tier, DatasetTier::Large);
    }

    #[test]
    fn missing_tier_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        assert!(discover_clips(&ws, DatasetTier::Small).unwrap().is_empty());
    }

    #[test]
    fn transcript_is_normalized() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        add_clip(&ws, DatasetTier::Micro, "c", "  Bin BLUE\n at  F two\n");
        let clip = &discover_clips(&ws, DatasetTier::Micro).unwrap()[0];
        assert_eq!(clip.transcript().unwrap(), "bin blue at f two");
    }

    #[test]
    fn missing_transcript_is_a_dataview_error() {
        let dir = TempDir::new().unwrap();
        let clip_dir = dir.path().join("c");
        std::fs::create_dir_all(&clip_dir).unwrap();
        std::fs::write(clip_dir.join("video.MOV"), b"").unwrap();
        let clip = RawClip::from_dir(DatasetTier::Nano, &clip_dir).unwrap();
        assert!(matches!(
            clip.transcript(),
            Err(LipreadError::Dataview { .. })
        ));
    }
}
