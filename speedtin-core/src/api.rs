// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Public entry point.
//!
//! ```no_run
//! use speedtin_core::{Measurement, SpeedTinApi};
//!
//! # fn main() -> speedtin_core::SpeedTinResult<()> {
//! let mut api = SpeedTinApi::from_env()?;
//!
//! api.add_benchmark("create_10_users")?;
//! api.add_benchmark("select_100_users")?;
//!
//! let vcs = api.git_metadata_from_path(file!())?;
//! api.add_measurement(
//!     "create_10_users",
//!     Measurement::new(1.8).version("2.2").released(true).vcs(&vcs),
//! );
//! api.add_measurement(
//!     "select_100_users",
//!     Measurement::new(1.9).version("2.2").released(true).vcs(&vcs),
//! );
//!
//! api.commit()?;
//! # Ok(())
//! # }
//! ```
//!
//! `add_benchmark` and `add_measurement` only fill a local buffer; `commit`
//! is the only call that talks to the service. Benchmarks committed once are
//! remembered in the on-disk id cache, so later runs reference them by name
//! without recreating them.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::buffer::{Measurement, PendingBuffer};
use crate::cache::{IdentifierCache, JsonFileStore};
use crate::client::{HttpRemoteService, ProjectInfo, RemoteService};
use crate::commit::{CommitOrchestrator, CommitSummary};
use crate::config::{ClientConfig, ConfigLoader};
use crate::error::SpeedTinResult;
use crate::types::{BenchmarkRef, LocalKey, ProjectId};
use crate::vcs::{VcsMetadata, VcsMetadataExtractor};

/// Buffered client for one project.
pub struct SpeedTinApi<R: RemoteService = HttpRemoteService> {
    project: ProjectId,
    remote: R,
    cache: IdentifierCache,
    buffer: PendingBuffer,
    vcs: VcsMetadataExtractor,
}

impl SpeedTinApi<HttpRemoteService> {
    /// HTTP client with the JSON file cache under `config.cache_dir`.
    pub fn new(config: ClientConfig) -> SpeedTinResult<Self> {
        let remote = HttpRemoteService::new(&config)?;
        let cache = IdentifierCache::new(JsonFileStore::new(&config.cache_dir));
        Ok(Self::with_parts(config.project_id, remote, cache))
    }

    /// Configuration from `SPEEDTIN_AUTHORIZATION_KEY`, `SPEEDTIN_PROJECT_ID`
    /// and the other `SPEEDTIN_*` variables.
    pub fn from_env() -> SpeedTinResult<Self> {
        Self::new(ConfigLoader::from_env()?)
    }
}

impl<R: RemoteService> SpeedTinApi<R> {
    /// Assemble a client from explicit components.
    pub fn with_parts(project: ProjectId, remote: R, cache: IdentifierCache) -> Self {
        Self {
            project,
            remote,
            cache,
            buffer: PendingBuffer::new(),
            vcs: VcsMetadataExtractor::new(),
        }
    }

    pub fn with_vcs_extractor(mut self, vcs: VcsMetadataExtractor) -> Self {
        self.vcs = vcs;
        self
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn buffer(&self) -> &PendingBuffer {
        &self.buffer
    }

    pub fn cache_mut(&mut self) -> &mut IdentifierCache {
        &mut self.cache
    }

    /// Register a benchmark to be created on commit. Returns the key to
    /// reference it with; adding the same name again returns the same key.
    pub fn add_benchmark(&mut self, name: &str) -> SpeedTinResult<LocalKey> {
        Ok(self.buffer.add_benchmark(name)?)
    }

    /// Queue a measurement for a benchmark key, name or server id. Unknown
    /// references are reported by `commit`, not here.
    pub fn add_measurement(&mut self, benchmark: impl Into<BenchmarkRef>, measurement: Measurement) {
        self.buffer.add_measurement(benchmark, measurement);
    }

    /// Send everything pending. On failure the unsent remainder stays
    /// buffered and a later `commit` retries only that.
    pub fn commit(&mut self) -> SpeedTinResult<CommitSummary> {
        let result =
            CommitOrchestrator::new(&self.project, &self.remote, &mut self.cache).run(&mut self.buffer);

        if let Err(e) = &result {
            tracing::warn!(
                error = %e,
                benchmarks = self.buffer.pending_benchmarks(),
                measurements = self.buffer.pending_measurements(),
                "Commit failed, unsent entries kept for the next commit"
            );
        }
        result
    }

    /// Check that the configured project exists and the key is accepted.
    pub fn check_project(&self) -> SpeedTinResult<ProjectInfo> {
        Ok(self.remote.create_or_get_project(&self.project)?)
    }

    /// Commit id, branch and commit date of the repository containing `path`.
    pub fn git_commit_id_branch_and_date_from_path(
        &self,
        path: impl AsRef<Path>,
    ) -> SpeedTinResult<(String, String, DateTime<Utc>)> {
        let metadata = self.vcs.extract(path)?;
        Ok((metadata.commit_id, metadata.branch, metadata.commit_date))
    }

    /// Same as [`Self::git_commit_id_branch_and_date_from_path`], as a struct.
    pub fn git_metadata_from_path(&self, path: impl AsRef<Path>) -> SpeedTinResult<VcsMetadata> {
        self.vcs.extract(path)
    }
}
