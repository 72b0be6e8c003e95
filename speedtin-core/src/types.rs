// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! Every identifier that crosses the client boundary (project ids, benchmark
//! names, server-assigned ids, credentials) is validated at creation time so
//! the rest of the crate can rely on it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum benchmark name length accepted by the remote service.
pub const MAX_BENCHMARK_NAME_LEN: usize = 50;

/// Project ids go verbatim into request paths and cache directory names, so
/// only unreserved URL characters are accepted.
fn is_project_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')
}

/// Project identifier as shown in the dashboard next to the project name.
/// Also used as the per-project cache directory name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId(String);

impl ProjectId {
    /// Create a new ProjectId with validation.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();

        if id.trim().is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: "project_id",
                value: id,
                reason: "Project ID cannot be empty".to_string(),
            });
        }

        if !id.chars().all(is_project_id_char) || id == "." || id == ".." {
            return Err(ValidationError::InvalidFieldValue {
                field: "project_id",
                value: id,
                reason: "Project ID may only contain ASCII letters, digits, '-', '_', '.' and '~'"
                    .to_string(),
            });
        }

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ProjectId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.0
    }
}

/// Validated benchmark name.
/// Must be non-empty and at most [`MAX_BENCHMARK_NAME_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BenchmarkName(String);

impl BenchmarkName {
    /// Create a new BenchmarkName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: "benchmark_name",
                value: name,
                reason: "Benchmark name cannot be empty".to_string(),
            });
        }

        let len = name.chars().count();
        if len > MAX_BENCHMARK_NAME_LEN {
            return Err(ValidationError::InvalidFieldValue {
                field: "benchmark_name",
                value: name,
                reason: format!(
                    "The maximum benchmark name size is {} chars. The one passed has: {} chars",
                    MAX_BENCHMARK_NAME_LEN, len
                ),
            });
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BenchmarkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for BenchmarkName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BenchmarkName> for String {
    fn from(name: BenchmarkName) -> Self {
        name.0
    }
}

/// Identifier assigned by the remote service to a benchmark.
///
/// The service reports ids as JSON numbers, but older payloads carry them as
/// decimal strings; both forms deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BenchmarkId(u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl BenchmarkId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BenchmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for BenchmarkId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Ok(Self(n)),
            RawId::Text(s) => s.trim().parse::<u64>().map(Self).map_err(|_| {
                serde::de::Error::custom(format!("invalid benchmark id: {:?}", s))
            }),
        }
    }
}

impl From<BenchmarkId> for u64 {
    fn from(id: BenchmarkId) -> Self {
        id.0
    }
}

impl From<u64> for BenchmarkId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Buffer-scoped key returned by `add_benchmark`.
///
/// The key is derived from the benchmark name, so a measurement may reference
/// a benchmark either by the key or by the name it was added with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalKey(BenchmarkName);

impl LocalKey {
    pub(crate) fn for_name(name: BenchmarkName) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &BenchmarkName {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for LocalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a pending measurement points at its benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BenchmarkRef {
    /// A local key or benchmark name, resolved at commit time.
    Key(String),
    /// A server id already known to the caller; submitted as-is.
    Id(BenchmarkId),
}

impl fmt::Display for BenchmarkRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchmarkRef::Key(key) => write!(f, "{}", key),
            BenchmarkRef::Id(id) => write!(f, "#{}", id),
        }
    }
}

impl From<&str> for BenchmarkRef {
    fn from(key: &str) -> Self {
        BenchmarkRef::Key(key.to_string())
    }
}

impl From<String> for BenchmarkRef {
    fn from(key: String) -> Self {
        BenchmarkRef::Key(key)
    }
}

impl From<&LocalKey> for BenchmarkRef {
    fn from(key: &LocalKey) -> Self {
        BenchmarkRef::Key(key.as_str().to_string())
    }
}

impl From<LocalKey> for BenchmarkRef {
    fn from(key: LocalKey) -> Self {
        BenchmarkRef::Key(String::from(key.0))
    }
}

impl From<BenchmarkId> for BenchmarkRef {
    fn from(id: BenchmarkId) -> Self {
        BenchmarkRef::Id(id)
    }
}

/// Authorization key sent with every request.
/// Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthKey(String);

impl AuthKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: "authorization_key",
                value: String::new(),
                reason: "Authorization key cannot be empty".to_string(),
            });
        }
        Ok(Self(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthKey(***)")
    }
}
