// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `speedtin check` command - Verify project and credentials against the service.

use speedtin_core::SpeedTinApi;

use super::Context;

pub fn execute(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let config = ctx.client_config()?;
    let base_url = config.base_url.clone();
    let api = SpeedTinApi::new(config)?;

    let project = api.check_project()?;
    println!("✓ Connected to {}", base_url);
    println!("  Project id:   {}", project.id);
    println!(
        "  Project name: {}",
        project.name.as_deref().unwrap_or("(unnamed)")
    );
    Ok(())
}
