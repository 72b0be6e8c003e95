// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `speedtin validate` command - Validate configuration file.

use std::path::Path;

use speedtin_core::ConfigLoader;

pub fn execute(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %file.display(), "Validating configuration");

    if let Err(e) = ConfigLoader::check_file(file) {
        eprintln!("✗ Configuration validation failed:");
        eprintln!("  {}", e);
        std::process::exit(1);
    }

    println!("✓ Configuration file is valid");

    // Show what the file resolves to once the environment is applied.
    match ConfigLoader::load_file(file) {
        Ok(config) => {
            println!();
            println!("Resolved Settings:");
            println!("  Project:         {}", config.project_id);
            println!("  Base URL:        {}", config.base_url);
            println!("  Cache Directory: {}", config.cache_dir.display());
            println!("  Timeout:         {}ms", config.timeout_ms);
        }
        Err(e) => {
            println!();
            println!("Not usable on its own yet: {}", e);
        }
    }
    Ok(())
}
