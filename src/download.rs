//! Dictionary download with checksum verification.

use crate::dictionary::{DictionaryInfo, installed_path};
use crate::error::{LipreadError, Result};
use crate::workspace::Workspace;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

fn download_error(message: String) -> LipreadError {
    LipreadError::Download { message }
}

/// Hex SHA-256 of a byte slice.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Check a file on disk against an expected SHA-256. An empty expectation always passes.
pub fn verify_file(path: &Path, expected: &str) -> Result<bool> {
    if expected.is_empty() {
        return Ok(true);
    }
    let bytes = fs::read(path)?;
    Ok(sha256_hex(&bytes) == expected)
}

/// Core download: fetch `url` into `output_path`, verifying `sha256` when non-empty.
async fn download_to_path(
    label: &str,
    url: &str,
    sha256: &str,
    output_path: &Path,
    progress: bool,
) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    tracing::info!(%url, "downloading {label}");

    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| download_error(format!("Failed to start download: {e}")))?;

    if !response.status().is_success() {
        return Err(download_error(format!(
            "{url} answered with status {}",
            response.status()
        )));
    }

    let total_size = response.content_length().unwrap_or(0);
    let pb = if progress {
        let pb = ProgressBar::new(total_size);
        pb.set_style(
            // SAFETY: hardcoded template string, always valid
            #[allow(clippy::expect_used)]
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .expect("hardcoded progress bar template")
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut hasher = Sha256::new();
    let mut stream = response.bytes_stream();
    let mut file = fs::File::create(output_path)?;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| download_error(format!("Failed to read download chunk: {e}")))?;
        file.write_all(&chunk)?;
        hasher.update(&chunk);
        if let Some(ref pb) = pb {
            pb.inc(chunk.len() as u64);
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Downloaded");
    }

    if !sha256.is_empty() {
        let calculated = format!("{:x}", hasher.finalize());
        if calculated != sha256 {
            if let Err(e) = fs::remove_file(output_path) {
                tracing::warn!("failed to remove corrupted download: {e}");
            }
            return Err(download_error(format!(
                "SHA-256 checksum mismatch. Expected: {sha256}, got: {calculated}"
            )));
        }
        tracing::debug!("checksum verified");
    }

    Ok(())
}

/// Install a catalog dictionary into the workspace. Already installed files are kept.
pub async fn install_dictionary(
    workspace: &Workspace,
    info: &DictionaryInfo,
    progress: bool,
) -> Result<PathBuf> {
    let path = installed_path(workspace, info);
    if path.is_file() {
        tracing::info!(path = %path.display(), "dictionary already installed");
        return Ok(path);
    }
    download_to_path(
        &format!("{} dictionary ({} KB)", info.display_name, info.size_kb),
        info.url,
        info.sha256,
        &path,
        progress,
    )
    .await?;
    tracing::info!(path = %path.display(), "dictionary installed");
    Ok(path)
}
