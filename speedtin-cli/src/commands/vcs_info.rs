// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `speedtin vcs-info` command - Show the git metadata a measurement would carry.

use std::path::Path;

use speedtin_core::buffer::COMMIT_DATE_FORMAT;
use speedtin_core::VcsMetadataExtractor;

pub fn execute(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = VcsMetadataExtractor::new().extract(path)?;

    println!("Repository:  {}", metadata.repository_root.display());
    println!("Commit:      {}", metadata.commit_id);
    println!("Branch:      {}", metadata.branch);
    println!(
        "Commit date: {} UTC",
        metadata.commit_date.format(COMMIT_DATE_FORMAT)
    );
    Ok(())
}
