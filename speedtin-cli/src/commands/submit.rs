// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `speedtin submit` command - Record measurements and commit them.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;
use speedtin_core::{Measurement, SpeedTinApi};

use super::{CliError, Context};

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Benchmark name (created on first use)
    #[arg(short, long)]
    pub benchmark: String,

    /// Measured value; repeat to submit several measurements
    #[arg(long, required = true)]
    pub value: Vec<f64>,

    /// Version of the code that was measured
    #[arg(long = "version", default_value = "dev")]
    pub code_version: String,

    /// Mark the version as released
    #[arg(long)]
    pub released: bool,

    /// Read branch, commit id and commit date from the checkout at this path
    #[arg(long)]
    pub from_git: Option<PathBuf>,

    #[arg(long)]
    pub branch: Option<String>,

    #[arg(long, requires = "commit_date")]
    pub commit_id: Option<String>,

    /// RFC 3339 date or unix timestamp
    #[arg(long, requires = "commit_id")]
    pub commit_date: Option<String>,

    #[arg(long)]
    pub machine_name: Option<String>,

    #[arg(long)]
    pub tag1: Option<String>,

    #[arg(long)]
    pub tag2: Option<String>,
}

pub fn execute(ctx: &Context, args: SubmitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = ctx.client_config()?;
    tracing::info!(
        project = %config.project_id,
        base_url = %config.base_url,
        benchmark = %args.benchmark,
        "Submitting measurements"
    );

    let mut api = SpeedTinApi::new(config)?;
    let key = api.add_benchmark(&args.benchmark)?;
    let template = build_measurement(&api, &args)?;

    for value in &args.value {
        let mut measurement = template.clone();
        measurement.value = *value;
        api.add_measurement(&key, measurement);
    }

    let summary = api.commit()?;

    println!("✓ Committed to project {}", api.project());
    println!("  Benchmarks created:     {}", summary.benchmarks_created);
    println!("  Benchmarks from cache:  {}", summary.benchmarks_cached);
    println!("  Measurements submitted: {}", summary.measurements_submitted);
    Ok(())
}

/// Measurement carrying every tag from the arguments. Explicit flags win
/// over values read from git.
fn build_measurement(
    api: &SpeedTinApi,
    args: &SubmitArgs,
) -> Result<Measurement, Box<dyn std::error::Error>> {
    let mut measurement = Measurement::new(0.0)
        .version(args.code_version.clone())
        .released(args.released);

    if let Some(path) = &args.from_git {
        let vcs = api.git_metadata_from_path(path)?;
        measurement = measurement.vcs(&vcs);
    }
    if let Some(branch) = &args.branch {
        measurement = measurement.branch(branch.clone());
    }
    if let (Some(commit_id), Some(date)) = (&args.commit_id, &args.commit_date) {
        measurement = measurement.commit(commit_id.clone(), parse_commit_date(date)?);
    }
    if let Some(machine_name) = &args.machine_name {
        measurement = measurement.machine_name(machine_name.clone());
    }
    if args.tag1.is_some() || args.tag2.is_some() {
        measurement = measurement.tags(
            args.tag1.clone().unwrap_or_default(),
            args.tag2.clone().unwrap_or_default(),
        );
    }
    Ok(measurement)
}

fn parse_commit_date(value: &str) -> Result<DateTime<Utc>, CliError> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| CliError::InvalidCommitDate {
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_commit_date() {
        let expected = Utc.with_ymd_and_hms(2015, 10, 11, 15, 30, 39).unwrap();
        assert_eq!(parse_commit_date("2015-10-11T15:30:39Z").unwrap(), expected);
        assert_eq!(parse_commit_date("2015-10-11T17:30:39+02:00").unwrap(), expected);
        assert_eq!(parse_commit_date("1444577439").unwrap(), expected);
        assert!(matches!(
            parse_commit_date("last tuesday"),
            Err(CliError::InvalidCommitDate { .. })
        ));
    }
}
