// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Version control metadata for measurements.
//!
//! Given any path inside a git checkout, finds the repository root and reads
//! the current commit id, branch and commit date from it. Read-only; `git` is
//! run inside the discovered root, never in the process working directory.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};

use crate::error::{SpeedTinError, SpeedTinResult};

/// Entry marking a repository root. A directory for normal checkouts, a file
/// for worktrees and submodules.
const REPOSITORY_MARKER: &str = ".git";

/// What a measurement needs to know about the code it measured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsMetadata {
    pub commit_id: String,
    /// `HEAD` when the checkout is detached.
    pub branch: String,
    /// Committer date of the current commit.
    pub commit_date: DateTime<Utc>,
    pub repository_root: PathBuf,
}

/// Reads commit metadata by shelling out to `git`.
#[derive(Debug, Clone)]
pub struct VcsMetadataExtractor {
    git: PathBuf,
}

impl Default for VcsMetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl VcsMetadataExtractor {
    /// Extractor using `git` from `PATH`.
    pub fn new() -> Self {
        Self {
            git: PathBuf::from("git"),
        }
    }

    /// Extractor using a specific git binary.
    pub fn with_git(git: impl Into<PathBuf>) -> Self {
        Self { git: git.into() }
    }

    /// Commit id, branch and commit date of the repository containing `path`.
    pub fn extract(&self, path: impl AsRef<Path>) -> SpeedTinResult<VcsMetadata> {
        let repository_root = find_repository_root(path.as_ref())?;

        let commit_id = self.run_git(&repository_root, &["rev-parse", "HEAD"])?;
        let branch = self.run_git(&repository_root, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        let timestamp =
            self.run_git(&repository_root, &["show", "-s", "--format=%ct", &commit_id])?;
        let commit_date = parse_commit_timestamp(&timestamp)?;

        tracing::debug!(
            root = %repository_root.display(),
            commit = %commit_id,
            branch = %branch,
            "Extracted VCS metadata"
        );

        Ok(VcsMetadata {
            commit_id,
            branch,
            commit_date,
            repository_root,
        })
    }

    fn run_git(&self, root: &Path, args: &[&str]) -> SpeedTinResult<String> {
        let command = format!("{} {}", self.git.display(), args.join(" "));

        let output = Command::new(&self.git)
            .args(args)
            .current_dir(root)
            .output()
            .map_err(|e| SpeedTinError::VcsCommand {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeedTinError::VcsCommand {
                command,
                message: format!("exited with {}: {}", output.status, stderr.trim()),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| SpeedTinError::VcsCommand {
            command: command.clone(),
            message: format!("non UTF-8 output: {}", e),
        })?;

        Ok(stdout.trim().to_string())
    }
}

/// Walk up from `path` to the nearest directory holding a `.git` entry.
pub fn find_repository_root(path: &Path) -> SpeedTinResult<PathBuf> {
    if !path.exists() {
        return Err(SpeedTinError::PathNotFound {
            path: path.to_path_buf(),
        });
    }

    let absolute = path.canonicalize().map_err(|e| SpeedTinError::Io {
        context: "resolving repository path",
        source: e,
    })?;

    let mut current = Some(absolute.as_path());
    while let Some(dir) = current {
        if dir.join(REPOSITORY_MARKER).exists() {
            return Ok(dir.to_path_buf());
        }
        current = dir.parent();
    }

    Err(SpeedTinError::NotAVcsRepository {
        path: path.to_path_buf(),
    })
}

/// Seconds since the epoch, as printed by `%ct`, to a UTC date.
fn parse_commit_timestamp(value: &str) -> SpeedTinResult<DateTime<Utc>> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| SpeedTinError::InvalidCommitDate {
            value: value.to_string(),
        })
}
