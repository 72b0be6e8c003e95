//! SpeedTin Core Library
//!
//! Client-side buffering layer for submitting benchmark results to the
//! SpeedTin REST API. Provides the pending buffer, the per-project id cache,
//! the blocking HTTP client, the commit orchestrator and git metadata
//! extraction.

pub mod api;
pub mod buffer;
pub mod cache;
pub mod client;
pub mod commit;
pub mod config;
pub mod error;
pub mod types;
pub mod vcs;

// Re-export commonly used types
pub use api::SpeedTinApi;
pub use buffer::{Measurement, PendingBuffer};
pub use cache::{CacheStore, IdentifierCache, JsonFileStore, MemoryStore};
pub use client::{HttpRemoteService, RemoteService};
pub use commit::{CommitOrchestrator, CommitSummary};
pub use config::{ClientConfig, ConfigLoader, ConfigOverrides};
pub use error::{
    CacheStoreError, RemoteServiceError, SpeedTinError, SpeedTinResult, ValidationError,
};
pub use types::{AuthKey, BenchmarkId, BenchmarkName, BenchmarkRef, LocalKey, ProjectId};
pub use vcs::{VcsMetadata, VcsMetadataExtractor};
