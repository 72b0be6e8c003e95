// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `speedtin cache` command - Inspect or reset the benchmark id cache.

use clap::Subcommand;
use speedtin_core::{CacheStore, JsonFileStore};

use super::{CliError, Context};

#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// List cached benchmark ids for the project
    List,

    /// Remove the project's cache file
    Clear,
}

pub fn execute(ctx: &Context, action: CacheAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = ctx.client_config()?;
    let store = JsonFileStore::new(&config.cache_dir);
    let file = store.file_for(&config.project_id);

    match action {
        CacheAction::List => {
            let entries = store.load(&config.project_id).map_err(CliError::from)?;
            if entries.is_empty() {
                println!("No cached benchmarks for project {}.", config.project_id);
                return Ok(());
            }

            println!("Cache file: {}", file.display());
            println!();
            println!("{:<52} {:>12}", "BENCHMARK", "ID");
            for (name, id) in &entries {
                println!("{:<52} {:>12}", name.as_str(), id.value());
            }
            println!();
            println!("Total: {} benchmark(s)", entries.len());
        }
        CacheAction::Clear => {
            store.clear(&config.project_id).map_err(CliError::from)?;
            tracing::info!(file = %file.display(), "Cleared benchmark id cache");
            println!("✓ Cache cleared for project {}", config.project_id);
        }
    }
    Ok(())
}
