use crate::error::Result;
use candle_nn::VarMap;
use std::path::{Path, PathBuf};

/// Keeps the weights with the lowest validation error seen so far.
#[derive(Debug, Clone, PartialEq)]
pub struct BestCheckpoint {
    path: PathBuf,
    best_error: f64,
}

impl BestCheckpoint {
    /// Errors start at 1.0, so the first report below that is saved.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            best_error: 1.0,
        }
    }

    pub fn best_error(&self) -> f64 {
        self.best_error
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save `weights` if `error` is strictly lower than the best so far.
    ///
    /// Returns whether a checkpoint was written.
    pub fn report(&mut self, error: f64, weights: &VarMap) -> Result<bool> {
        if error >= self.best_error {
            return Ok(false);
        }
        self.best_error = error;
        if let Some(folder) = self.path.parent()
            && !folder.as_os_str().is_empty()
        {
            std::fs::create_dir_all(folder)?;
        }
        weights.save(&self.path)?;
        tracing::info!(
            error = self.best_error,
            path = %self.path.display(),
            "saved best checkpoint"
        );
        Ok(true)
    }
}
