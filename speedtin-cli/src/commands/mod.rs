// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

use std::path::PathBuf;

use speedtin_core::{CacheStoreError, ClientConfig, ConfigLoader, ConfigOverrides, SpeedTinResult};
use thiserror::Error;

pub mod cache;
pub mod check;
pub mod submit;
pub mod validate;
pub mod vcs_info;

/// Errors raised by the CLI itself rather than the client library.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid commit date '{value}': expected RFC 3339 or a unix timestamp")]
    InvalidCommitDate { value: String },

    #[error(transparent)]
    Cache(#[from] CacheStoreError),
}

/// Global options shared by every command.
pub struct Context {
    config: Option<PathBuf>,
    overrides: ConfigOverrides,
}

impl Context {
    pub fn new(config: Option<PathBuf>, project: Option<String>, base_url: Option<String>) -> Self {
        Self {
            config,
            overrides: ConfigOverrides {
                project_id: project,
                base_url,
                ..ConfigOverrides::default()
            },
        }
    }

    /// Layer the config file, environment and command-line overrides.
    pub fn client_config(&self) -> SpeedTinResult<ClientConfig> {
        ConfigLoader::resolve(self.config.as_deref(), self.overrides.clone())
    }
}
