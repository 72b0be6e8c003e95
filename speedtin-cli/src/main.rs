// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! SpeedTin CLI
//!
//! Command-line front end for submitting benchmark measurements to SpeedTin.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Context;

/// SpeedTin - submit benchmark results and track performance over time
#[derive(Parser)]
#[command(name = "speedtin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project id (overrides config file and SPEEDTIN_PROJECT_ID)
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Service URL (overrides config file and SPEEDTIN_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a measurement for a benchmark and commit it
    Submit(commands::submit::SubmitArgs),

    /// Print commit id, branch and commit date for a path
    VcsInfo {
        /// Any path inside a git checkout
        path: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: PathBuf,
    },

    /// Inspect or reset the local benchmark id cache
    Cache {
        #[command(subcommand)]
        action: commands::cache::CacheAction,
    },

    /// Check that the project exists and the credentials are accepted
    Check,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let ctx = Context::new(cli.config, cli.project, cli.base_url);

    // Dispatch to command handlers
    match cli.command {
        Commands::Submit(args) => commands::submit::execute(&ctx, args),
        Commands::VcsInfo { path } => commands::vcs_info::execute(&path),
        Commands::Validate { file } => commands::validate::execute(&file),
        Commands::Cache { action } => commands::cache::execute(&ctx, action),
        Commands::Check => commands::check::execute(&ctx),
    }
}
