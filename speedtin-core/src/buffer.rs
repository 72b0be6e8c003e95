// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Pending buffer of benchmarks and measurements awaiting commit.
//!
//! Nothing in here talks to the network. Benchmarks are deduplicated by name
//! within the buffer; measurement references are not checked until commit,
//! because the benchmark they name may be added later in the same buffer.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::client::MeasurementPayload;
use crate::error::ValidationError;
use crate::types::{BenchmarkName, BenchmarkRef, LocalKey};
use crate::vcs::VcsMetadata;

/// Wire format of commit dates.
pub const COMMIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One data point for a benchmark, with its version and VCS tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Meaning depends on the unit configured for the benchmark (seconds, count, ...).
    pub value: f64,
    pub version: String,
    /// Whether this version was released to users. Regression reports compare
    /// against the latest released version.
    pub released: bool,
    pub branch: String,
    pub commit_id: String,
    pub commit_date: Option<DateTime<Utc>>,
    pub os: String,
    pub machine_name: String,
    pub tag1: String,
    pub tag2: String,
}

impl Measurement {
    /// A measurement of `value` for version `dev`, unreleased, on the current OS.
    pub fn new(value: f64) -> Self {
        Self {
            value,
            version: "dev".to_string(),
            released: false,
            branch: String::new(),
            commit_id: String::new(),
            commit_date: None,
            os: std::env::consts::OS.to_string(),
            machine_name: String::new(),
            tag1: String::new(),
            tag2: String::new(),
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn released(mut self, released: bool) -> Self {
        self.released = released;
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn commit(mut self, commit_id: impl Into<String>, commit_date: DateTime<Utc>) -> Self {
        self.commit_id = commit_id.into();
        self.commit_date = Some(commit_date);
        self
    }

    /// Take branch, commit id and commit date from extracted VCS metadata.
    pub fn vcs(self, metadata: &VcsMetadata) -> Self {
        self.branch(metadata.branch.clone())
            .commit(metadata.commit_id.clone(), metadata.commit_date)
    }

    pub fn os(mut self, os: impl Into<String>) -> Self {
        self.os = os.into();
        self
    }

    pub fn machine_name(mut self, machine_name: impl Into<String>) -> Self {
        self.machine_name = machine_name.into();
        self
    }

    pub fn tags(mut self, tag1: impl Into<String>, tag2: impl Into<String>) -> Self {
        self.tag1 = tag1.into();
        self.tag2 = tag2.into();
        self
    }

    /// Request body for the measurement endpoint.
    pub fn to_payload(&self) -> MeasurementPayload {
        MeasurementPayload {
            value: self.value,
            version: self.version.clone(),
            released: self.released,
            branch: self.branch.clone(),
            os: self.os.clone(),
            commit_id: self.commit_id.clone(),
            commit_date: self
                .commit_date
                .map(|date| date.format(COMMIT_DATE_FORMAT).to_string())
                .unwrap_or_default(),
            machine_name: self.machine_name.clone(),
            tag1: self.tag1.clone(),
            tag2: self.tag2.clone(),
        }
    }
}

/// Benchmark waiting for its server id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBenchmark {
    pub key: LocalKey,
}

impl PendingBenchmark {
    pub fn name(&self) -> &BenchmarkName {
        self.key.name()
    }
}

/// Measurement waiting to be submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMeasurement {
    pub benchmark: BenchmarkRef,
    pub measurement: Measurement,
}

/// Insertion-ordered buffer drained by the commit orchestrator.
#[derive(Debug, Default)]
pub struct PendingBuffer {
    benchmarks: VecDeque<PendingBenchmark>,
    measurements: VecDeque<PendingMeasurement>,
}

impl PendingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a benchmark. Adding a name already pending returns the
    /// existing key without adding a second entry.
    pub fn add_benchmark(&mut self, name: &str) -> Result<LocalKey, ValidationError> {
        if let Some(existing) = self.find_benchmark(name) {
            return Ok(existing.key.clone());
        }

        let key = LocalKey::for_name(BenchmarkName::new(name)?);
        self.benchmarks.push_back(PendingBenchmark { key: key.clone() });
        Ok(key)
    }

    /// Queue a measurement. The reference is resolved at commit time.
    pub fn add_measurement(&mut self, benchmark: impl Into<BenchmarkRef>, measurement: Measurement) {
        self.measurements.push_back(PendingMeasurement {
            benchmark: benchmark.into(),
            measurement,
        });
    }

    /// Pending benchmark added under this key or name, if any.
    pub fn find_benchmark(&self, key: &str) -> Option<&PendingBenchmark> {
        self.benchmarks.iter().find(|b| b.key.as_str() == key)
    }

    pub fn benchmarks(&self) -> impl Iterator<Item = &PendingBenchmark> {
        self.benchmarks.iter()
    }

    pub fn measurements(&self) -> impl Iterator<Item = &PendingMeasurement> {
        self.measurements.iter()
    }

    pub fn pending_benchmarks(&self) -> usize {
        self.benchmarks.len()
    }

    pub fn pending_measurements(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty() && self.measurements.is_empty()
    }

    /// Discard everything pending.
    pub fn clear(&mut self) {
        self.benchmarks.clear();
        self.measurements.clear();
    }

    pub(crate) fn front_benchmark(&self) -> Option<&PendingBenchmark> {
        self.benchmarks.front()
    }

    pub(crate) fn pop_benchmark(&mut self) -> Option<PendingBenchmark> {
        self.benchmarks.pop_front()
    }

    pub(crate) fn front_measurement(&self) -> Option<&PendingMeasurement> {
        self.measurements.front()
    }

    pub(crate) fn pop_measurement(&mut self) -> Option<PendingMeasurement> {
        self.measurements.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BenchmarkId;
    use chrono::TimeZone;

    #[test]
    fn test_add_benchmark_is_idempotent() {
        let mut buffer = PendingBuffer::new();
        let first = buffer.add_benchmark("x").unwrap();
        let second = buffer.add_benchmark("x").unwrap();

        assert_eq!(first, second);
        assert_eq!(buffer.pending_benchmarks(), 1);
    }

    #[test]
    fn test_add_benchmark_rejects_long_names() {
        let mut buffer = PendingBuffer::new();
        assert!(buffer.add_benchmark(&"n".repeat(51)).is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut buffer = PendingBuffer::new();
        buffer.add_benchmark("b2").unwrap();
        buffer.add_benchmark("b1").unwrap();
        buffer.add_benchmark("b3").unwrap();
        buffer.add_measurement("b3", Measurement::new(1.0));
        buffer.add_measurement("b1", Measurement::new(2.0));

        let names: Vec<_> = buffer.benchmarks().map(|b| b.name().as_str()).collect();
        assert_eq!(names, vec!["b2", "b1", "b3"]);

        let values: Vec<_> = buffer.measurements().map(|m| m.measurement.value).collect();
        assert_eq!(values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_unknown_reference_accepted_at_add_time() {
        let mut buffer = PendingBuffer::new();
        buffer.add_measurement("never_added", Measurement::new(1.0));
        buffer.add_measurement(BenchmarkId::new(12), Measurement::new(1.0));
        assert_eq!(buffer.pending_measurements(), 2);
    }

    #[test]
    fn test_measurement_defaults() {
        let m = Measurement::new(1.8);
        assert_eq!(m.version, "dev");
        assert!(!m.released);
        assert_eq!(m.os, std::env::consts::OS);

        let payload = m.to_payload();
        assert_eq!(payload.commit_date, "");
        assert_eq!(payload.branch, "");
    }

    #[test]
    fn test_payload_date_format() {
        let date = Utc.with_ymd_and_hms(2015, 10, 11, 15, 30, 39).unwrap();
        let payload = Measurement::new(1.9)
            .version("2.2")
            .released(true)
            .branch("master")
            .commit("abc123", date)
            .tags("t1", "t2")
            .to_payload();

        assert_eq!(payload.commit_date, "2015-10-11 15:30:39.000000");
        assert_eq!(payload.commit_id, "abc123");
        assert!(payload.released);
        assert_eq!(payload.tag2, "t2");
    }

    #[test]
    fn test_pop_drains_in_order() {
        let mut buffer = PendingBuffer::new();
        buffer.add_benchmark("a").unwrap();
        buffer.add_benchmark("b").unwrap();

        assert_eq!(buffer.front_benchmark().unwrap().name().as_str(), "a");
        assert_eq!(buffer.pop_benchmark().unwrap().name().as_str(), "a");
        assert_eq!(buffer.pop_benchmark().unwrap().name().as_str(), "b");
        assert!(buffer.pop_benchmark().is_none());
    }
}
