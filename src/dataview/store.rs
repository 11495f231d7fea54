use crate::dataview::example::Example;
use crate::error::Result;
use crate::workspace::{DatasetTier, Workspace};
use std::path::PathBuf;

/// Example count and total frames of one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierStats {
    pub tier: DatasetTier,
    pub examples: usize,
    pub frames: usize,
}

/// Dataview files of `tier`, sorted. `all` spans every collected tier.
pub fn example_files(workspace: &Workspace, tier: DatasetTier) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for member in tier.members() {
        let dir = workspace.dataview_dir(member);
        if !dir.is_dir() {
            continue;
        }
        let mut found: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "json"))
            .collect();
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

pub fn load_tier(workspace: &Workspace, tier: DatasetTier) -> Result<Vec<Example>> {
    let examples = example_files(workspace, tier)?
        .iter()
        .map(|p| Example::load(p))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(%tier, count = examples.len(), "loaded dataview");
    Ok(examples)
}

/// Stats for every tier including `all`.
pub fn tier_stats(workspace: &Workspace) -> Result<Vec<TierStats>> {
    let mut stats: Vec<TierStats> = Vec::new();
    for tier in DatasetTier::COLLECTED {
        let examples = load_tier(workspace, tier)?;
        stats.push(TierStats {
            tier,
            examples: examples.len(),
            frames: examples.iter().map(Example::num_frames).sum(),
        });
    }
    let all = TierStats {
        tier: DatasetTier::All,
        examples: stats.iter().map(|s| s.examples).sum(),
        frames: stats.iter().map(|s| s.frames).sum(),
    };
    stats.push(all);
    Ok(stats)
}
