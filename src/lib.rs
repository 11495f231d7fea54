//! lipread - Lip reading from video
//!
//! Video frames → face box → 68 landmarks → sequence model → characters →
//! words → sentence.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod correction;
pub mod dataview;
pub mod defaults;
pub mod dictionary;
#[cfg(feature = "model-download")]
pub mod download;
pub mod error;
pub mod evaluate;
pub mod exec;
pub mod flags;
pub mod logging;
pub mod model;
#[cfg(feature = "cli")]
pub mod output;
pub mod pipeline;
pub mod recognize;
pub mod video;
pub mod vision;
pub mod workspace;

// Composition root
#[cfg(feature = "cli")]
pub mod app;

// Core seams (source → process → sink)
pub use correction::Corrector;
pub use exec::{CommandExecutor, SystemCommandExecutor};
pub use pipeline::sink::{CollectorSink, StdoutSink, TextSink};
pub use recognize::{Recognition, Recognizer};
pub use vision::{FaceDetector, LandmarkPredictor};

// Pipeline
pub use pipeline::orchestrator::{Pipeline, PipelineConfig, PipelineSummary};

// Error handling
pub use error::{LipreadError, Result};

// Config
pub use config::Config;
pub use workspace::{DatasetTier, Workspace};

// Station framework
pub use pipeline::error::{ErrorReporter, StationError};
pub use pipeline::station::Station;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_contains_plus_when_git_hash_present() {
        let ver = version_string();
        // In a git repo build, GIT_HASH is set → expect "<version>+<hash>"
        // In CI without git, expect the plain version
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(
                ver.contains('+'),
                "With GIT_HASH set, version should contain '+', got: {}",
                ver
            );
            let hash_part = ver.split('+').nth(1).unwrap_or("");
            assert_eq!(
                hash_part.len(),
                7,
                "Git hash should be 7 chars, got: {}",
                hash_part
            );
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
