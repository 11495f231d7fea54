//! Workspace directory layout.
//!
//! ```text
//! $LIPREAD_ROOT/
//!   datasets/<tier>/<clip>.json     dataviews
//!   raw/<tier>/<clip>/video.*       collected videos
//!   raw/<tier>/<clip>/transcript.txt
//!   weights/                        face, landmark and sequence model weights
//!   logs/                           visualization logs
//! ```

use crate::config::Config;
use crate::defaults;
use crate::error::{LipreadError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Named dataset size tiers, in order of collection progress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum DatasetTier {
    Nano,
    Micro,
    Small,
    Medium,
    Large,
    All,
}

impl DatasetTier {
    /// Tiers that own a directory of their own (everything but `all`).
    pub const COLLECTED: [DatasetTier; 5] = [
        DatasetTier::Nano,
        DatasetTier::Micro,
        DatasetTier::Small,
        DatasetTier::Medium,
        DatasetTier::Large,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetTier::Nano => "nano",
            DatasetTier::Micro => "micro",
            DatasetTier::Small => "small",
            DatasetTier::Medium => "medium",
            DatasetTier::Large => "large",
            DatasetTier::All => "all",
        }
    }

    /// Directories that make up this tier.
    pub fn members(&self) -> Vec<DatasetTier> {
        match self {
            DatasetTier::All => Self::COLLECTED.to_vec(),
            tier => vec![*tier],
        }
    }
}

impl fmt::Display for DatasetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DatasetTier {
    type Err = LipreadError;

    fn from_str(s: &str) -> Result<Self> {
        Self::COLLECTED
            .iter()
            .chain(std::iter::once(&DatasetTier::All))
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| LipreadError::Workspace {
                message: format!("unknown dataset tier '{s}' (nano, micro, small, medium, large, all)"),
            })
    }
}

/// Resolved workspace root with accessors for each subdirectory.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the root from the config, falling back to the current directory.
    ///
    /// `LIPREAD_ROOT` and `--root` reach this through the config, so the
    /// command line wins over the environment.
    pub fn resolve(config: &Config) -> Result<Self> {
        if let Some(root) = &config.workspace.root {
            return Ok(Self::new(root));
        }
        let cwd = std::env::current_dir()?;
        tracing::debug!(root = %cwd.display(), "{} unset, using current directory", defaults::ROOT_ENV);
        Ok(Self::new(cwd))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn datasets_dir(&self) -> PathBuf {
        self.root.join("datasets")
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn weights_dir(&self) -> PathBuf {
        self.root.join("weights")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Dataview directory of a single collected tier.
    pub fn dataview_dir(&self, tier: DatasetTier) -> PathBuf {
        self.datasets_dir().join(tier.as_str())
    }

    /// Raw clip directory of a single collected tier.
    pub fn raw_tier_dir(&self, tier: DatasetTier) -> PathBuf {
        self.raw_dir().join(tier.as_str())
    }

    /// Path of a file inside `weights/`, unless overridden.
    pub fn weights_file(&self, overridden: Option<&Path>, default_name: &str) -> PathBuf {
        match overridden {
            Some(path) => path.to_path_buf(),
            None => self.weights_dir().join(default_name),
        }
    }

    /// Directory the SymSpell dictionaries are installed into.
    pub fn dictionaries_dir(&self) -> PathBuf {
        self.weights_dir().join("dictionaries")
    }

    /// Create the four top-level directories and the per-tier subdirectories.
    pub fn ensure_layout(&self) -> Result<()> {
        for dir in [
            self.datasets_dir(),
            self.raw_dir(),
            self.weights_dir(),
            self.logs_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| LipreadError::Workspace {
                message: format!("cannot create {}: {e}", dir.display()),
            })?;
        }
        for tier in DatasetTier::COLLECTED {
            std::fs::create_dir_all(self.dataview_dir(tier))?;
            std::fs::create_dir_all(self.raw_tier_dir(tier))?;
        }
        tracing::info!(root = %self.root.display(), "workspace layout ready");
        Ok(())
    }

    /// Whether all top-level directories exist.
    pub fn is_initialized(&self) -> bool {
        [
            self.datasets_dir(),
            self.raw_dir(),
            self.weights_dir(),
            self.logs_dir(),
        ]
        .iter()
        .all(|d| d.is_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn subdirectories_hang_off_root() {
        let ws = Workspace::new("/data/lips");
        assert_eq!(ws.datasets_dir(), PathBuf::from("/data/lips/datasets"));
        assert_eq!(ws.raw_dir(), PathBuf::from("/data/lips/raw"));
        assert_eq!(ws.weights_dir(), PathBuf::from("/data/lips/weights"));
        assert_eq!(ws.logs_dir(), PathBuf::from("/data/lips/logs"));
        assert_eq!(
            ws.dataview_dir(DatasetTier::Small),
            PathBuf::from("/data/lips/datasets/small")
        );
    }

    #[test]
    fn ensure_layout_creates_directories() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        assert!(!ws.is_initialized());

        ws.ensure_layout().unwrap();

        assert!(ws.is_initialized());
        assert!(ws.dataview_dir(DatasetTier::Nano).is_dir());
        assert!(ws.raw_tier_dir(DatasetTier::Large).is_dir());
        assert!(!ws.dataview_dir(DatasetTier::All).exists());
    }

    #[test]
    fn ensure_layout_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        ws.ensure_layout().unwrap();
        ws.ensure_layout().unwrap();
        assert!(ws.is_initialized());
    }

    #[test]
    fn weights_file_prefers_override() {
        let ws = Workspace::new("/ws");
        assert_eq!(
            ws.weights_file(None, "landmarks.safetensors"),
            PathBuf::from("/ws/weights/landmarks.safetensors")
        );
        assert_eq!(
            ws.weights_file(Some(Path::new("/elsewhere/m.safetensors")), "landmarks.safetensors"),
            PathBuf::from("/elsewhere/m.safetensors")
        );
    }

    #[test]
    fn tier_all_covers_every_collected_tier() {
        assert_eq!(DatasetTier::All.members(), DatasetTier::COLLECTED.to_vec());
        assert_eq!(DatasetTier::Micro.members(), vec![DatasetTier::Micro]);
    }

    #[test]
    fn tier_parses_from_name() {
        assert_eq!("medium".parse::<DatasetTier>().unwrap(), DatasetTier::Medium);
        assert_eq!("all".parse::<DatasetTier>().unwrap(), DatasetTier::All);
        assert!("huge".parse::<DatasetTier>().is_err());
    }

    #[test]
    fn tiers_are_ordered_by_size() {
        assert!(DatasetTier::Nano < DatasetTier::Micro);
        assert!(DatasetTier::Large < DatasetTier::All);
    }
}
