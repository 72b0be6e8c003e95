// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Commit orchestration: flushes a [`PendingBuffer`] to the remote service.
//!
//! Two phases, always in this order:
//!
//! 1. **Resolve benchmarks.** Each pending benchmark, in insertion order, is
//!    bound to a server id, from the [`IdentifierCache`] when possible and by
//!    a create call otherwise. New ids go into the cache immediately.
//! 2. **Submit measurements.** Each pending measurement, in insertion order,
//!    has its reference resolved (phase 1 bindings, then the cache, then one
//!    listing of the project's benchmarks) and is submitted.
//!
//! An entry leaves the buffer only once it has been handled. The first
//! failure stops the run and leaves that entry and everything after it in the
//! buffer, so calling commit again resumes where this run stopped. Benchmarks
//! resolved before the failure are in the cache by then and are not created
//! twice.

use std::collections::HashMap;

use crate::buffer::PendingBuffer;
use crate::cache::IdentifierCache;
use crate::client::RemoteService;
use crate::error::{SpeedTinError, SpeedTinResult};
use crate::types::{BenchmarkId, BenchmarkName, BenchmarkRef, ProjectId};

/// What a successful commit did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Benchmarks resolved through a remote create call.
    pub benchmarks_created: usize,
    /// Benchmarks resolved from the cache without a remote call.
    pub benchmarks_cached: usize,
    pub measurements_submitted: usize,
}

/// One commit run over a buffer, bound to a project, a remote service and a cache.
pub struct CommitOrchestrator<'a, R: RemoteService> {
    project: &'a ProjectId,
    remote: &'a R,
    cache: &'a mut IdentifierCache,
    /// Local key or name -> server id, built in phase 1.
    bindings: HashMap<String, BenchmarkId>,
    /// The project's benchmark list is fetched at most once per run.
    listed: bool,
    summary: CommitSummary,
}

impl<'a, R: RemoteService> CommitOrchestrator<'a, R> {
    pub fn new(project: &'a ProjectId, remote: &'a R, cache: &'a mut IdentifierCache) -> Self {
        Self {
            project,
            remote,
            cache,
            bindings: HashMap::new(),
            listed: false,
            summary: CommitSummary::default(),
        }
    }

    /// Drain `buffer` into the remote service. On error the buffer keeps the
    /// failing entry and everything not yet handled.
    pub fn run(mut self, buffer: &mut PendingBuffer) -> SpeedTinResult<CommitSummary> {
        tracing::info!(
            project = %self.project,
            benchmarks = buffer.pending_benchmarks(),
            measurements = buffer.pending_measurements(),
            "Committing results"
        );

        self.cache.load(self.project);
        self.resolve_benchmarks(buffer)?;
        self.submit_measurements(buffer)?;

        tracing::info!(
            created = self.summary.benchmarks_created,
            cached = self.summary.benchmarks_cached,
            measurements = self.summary.measurements_submitted,
            "Commit finished"
        );
        Ok(self.summary)
    }

    fn resolve_benchmarks(&mut self, buffer: &mut PendingBuffer) -> SpeedTinResult<()> {
        while let Some(pending) = buffer.front_benchmark() {
            let name = pending.name().clone();

            let id = match self.cache.lookup(self.project, &name) {
                Some(id) => {
                    tracing::debug!(benchmark = %name, id = %id, "Benchmark id found in cache");
                    self.summary.benchmarks_cached += 1;
                    id
                }
                None => {
                    let info = self.remote.create_or_get_benchmark(self.project, &name)?;
                    self.cache.store(self.project, &name, info.id);
                    tracing::info!(benchmark = %name, id = %info.id, "Saved benchmark");
                    self.summary.benchmarks_created += 1;
                    info.id
                }
            };

            self.bindings.insert(name.as_str().to_string(), id);
            buffer.pop_benchmark();
        }
        Ok(())
    }

    fn submit_measurements(&mut self, buffer: &mut PendingBuffer) -> SpeedTinResult<()> {
        while let Some(pending) = buffer.front_measurement() {
            let reference = pending.benchmark.clone();
            let payload = pending.measurement.to_payload();

            let id = self.resolve(&reference)?;
            let receipt = self.remote.create_measurement(self.project, id, &payload)?;
            tracing::info!(
                benchmark = %reference,
                id = %id,
                value = payload.value,
                receipt = ?receipt.id,
                "Saved measurement"
            );

            buffer.pop_measurement();
            self.summary.measurements_submitted += 1;
        }
        Ok(())
    }

    /// Server id for a measurement reference.
    fn resolve(&mut self, reference: &BenchmarkRef) -> SpeedTinResult<BenchmarkId> {
        let key = match reference {
            BenchmarkRef::Id(id) => return Ok(*id),
            BenchmarkRef::Key(key) => key,
        };

        if let Some(id) = self.bindings.get(key) {
            return Ok(*id);
        }

        let unknown = || SpeedTinError::UnknownBenchmark {
            reference: key.clone(),
        };

        // A key that is not a valid name can neither be cached nor exist remotely.
        let name = BenchmarkName::new(key.as_str()).map_err(|_| unknown())?;

        if let Some(id) = self.cache.lookup(self.project, &name) {
            return Ok(id);
        }

        if !self.listed {
            self.listed = true;
            let listed = self.remote.list_benchmarks(self.project)?;
            let pairs = listed
                .into_iter()
                .filter_map(|info| BenchmarkName::new(info.name).ok().map(|n| (n, info.id)));
            let added = self.cache.store_all(self.project, pairs);
            tracing::debug!(added = added, "Refreshed benchmark ids from the server");

            if let Some(id) = self.cache.lookup(self.project, &name) {
                return Ok(id);
            }
        }

        Err(unknown())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Measurement;
    use crate::client::{BenchmarkInfo, MeasurementPayload, MeasurementReceipt, ProjectInfo};
    use crate::error::RemoteServiceError;
    use std::cell::RefCell;

    /// Remote that assigns ids in call order and records every call.
    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
        next_id: RefCell<u64>,
    }

    impl RemoteService for Recorder {
        fn create_or_get_project(&self, _: &ProjectId) -> Result<ProjectInfo, RemoteServiceError> {
            unreachable!("commit never fetches the project")
        }

        fn create_or_get_benchmark(
            &self,
            _: &ProjectId,
            name: &BenchmarkName,
        ) -> Result<BenchmarkInfo, RemoteServiceError> {
            self.calls.borrow_mut().push(format!("create {}", name));
            let mut next = self.next_id.borrow_mut();
            let id = *next;
            *next += 1;
            Ok(BenchmarkInfo {
                id: BenchmarkId::new(id),
                name: name.to_string(),
            })
        }

        fn list_benchmarks(&self, _: &ProjectId) -> Result<Vec<BenchmarkInfo>, RemoteServiceError> {
            self.calls.borrow_mut().push("list".to_string());
            Ok(Vec::new())
        }

        fn create_measurement(
            &self,
            _: &ProjectId,
            benchmark: BenchmarkId,
            _: &MeasurementPayload,
        ) -> Result<MeasurementReceipt, RemoteServiceError> {
            self.calls.borrow_mut().push(format!("measure {}", benchmark));
            Ok(MeasurementReceipt { id: None })
        }
    }

    #[test]
    fn test_benchmarks_resolved_before_measurements() {
        let project = ProjectId::new("p").unwrap();
        let remote = Recorder::default();
        let mut cache = IdentifierCache::in_memory();
        let mut buffer = PendingBuffer::new();

        // Measurement queued before its benchmark is even added.
        buffer.add_measurement("b1", Measurement::new(1.0));
        buffer.add_benchmark("b1").unwrap();

        let summary = CommitOrchestrator::new(&project, &remote, &mut cache)
            .run(&mut buffer)
            .unwrap();

        assert_eq!(*remote.calls.borrow(), vec!["create b1", "measure 0"]);
        assert_eq!(summary.benchmarks_created, 1);
        assert_eq!(summary.measurements_submitted, 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_direct_id_skips_resolution() {
        let project = ProjectId::new("p").unwrap();
        let remote = Recorder::default();
        let mut cache = IdentifierCache::in_memory();
        let mut buffer = PendingBuffer::new();
        buffer.add_measurement(BenchmarkId::new(42), Measurement::new(1.0));

        CommitOrchestrator::new(&project, &remote, &mut cache)
            .run(&mut buffer)
            .unwrap();
        assert_eq!(*remote.calls.borrow(), vec!["measure 42"]);
    }

    #[test]
    fn test_invalid_key_is_unknown_without_listing() {
        let project = ProjectId::new("p").unwrap();
        let remote = Recorder::default();
        let mut cache = IdentifierCache::in_memory();
        let mut buffer = PendingBuffer::new();
        buffer.add_measurement("", Measurement::new(1.0));

        let err = CommitOrchestrator::new(&project, &remote, &mut cache)
            .run(&mut buffer)
            .unwrap_err();
        assert!(matches!(err, SpeedTinError::UnknownBenchmark { .. }));
        assert!(remote.calls.borrow().is_empty());
        assert_eq!(buffer.pending_measurements(), 1);
    }

    #[test]
    fn test_listing_happens_once_per_run() {
        let project = ProjectId::new("p").unwrap();
        let remote = Recorder::default();
        let mut cache = IdentifierCache::in_memory();
        let mut buffer = PendingBuffer::new();
        buffer.add_measurement("missing", Measurement::new(1.0));

        let _ = CommitOrchestrator::new(&project, &remote, &mut cache).run(&mut buffer);
        assert_eq!(*remote.calls.borrow(), vec!["list"]);
    }
}
