// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for the SpeedTin client.
//!
//! Explicit enum error types only. No `Box<dyn Error>`, no `anyhow::Result`.
//! `CacheStoreError` is not a variant of [`SpeedTinError`]: persistence
//! failures are logged and degrade the cache, they never reach the caller of
//! `commit()`.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the SpeedTin client.
#[derive(Debug, Error)]
pub enum SpeedTinError {
    // =========================================================================
    // Input Validation
    // =========================================================================
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Remote Service - Aborts The Current Commit
    // =========================================================================
    #[error(transparent)]
    Remote(#[from] RemoteServiceError),

    #[error("Unknown benchmark: {reference} was never added nor found in the cache")]
    UnknownBenchmark { reference: String },

    // =========================================================================
    // Version Control Metadata
    // =========================================================================
    #[error("The path: {} does not exist", .path.display())]
    PathNotFound { path: PathBuf },

    #[error("The path: {} does not seem to be a git-managed path", .path.display())]
    NotAVcsRepository { path: PathBuf },

    #[error("Command `{command}` failed: {message}")]
    VcsCommand { command: String, message: String },

    #[error("Invalid commit timestamp: {value}")]
    InvalidCommitDate { value: String },

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid input rejected before anything is buffered or sent.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field} (set {env_var} or pass it explicitly)")]
    MissingRequiredField {
        field: &'static str,
        env_var: &'static str,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Failure talking to the remote service: transport, HTTP status, or an
/// error payload in an otherwise successful response.
#[derive(Debug, Error)]
#[error("{context}. Url: {url}, status: {}, body: {body}", .status.map(|s| s.to_string()).unwrap_or_else(|| "none".to_string()))]
pub struct RemoteServiceError {
    /// What the client was trying to do.
    pub context: String,
    pub url: String,
    /// HTTP status, `None` when no response was received.
    pub status: Option<u16>,
    /// Response body, or the transport error message.
    pub body: String,
}

impl RemoteServiceError {
    pub fn transport(context: impl Into<String>, url: impl Into<String>, message: String) -> Self {
        Self {
            context: context.into(),
            url: url.into(),
            status: None,
            body: message,
        }
    }

    pub fn status(
        context: impl Into<String>,
        url: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self {
            context: context.into(),
            url: url.into(),
            status: Some(status),
            body: body.into(),
        }
    }
}

/// The local id cache could not be read or written.
#[derive(Debug, Error)]
#[error("Cache store error at {}: {reason}", .path.display())]
pub struct CacheStoreError {
    pub path: PathBuf,
    pub reason: String,
}

impl CacheStoreError {
    pub fn new(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias using SpeedTinError.
pub type SpeedTinResult<T> = Result<T, SpeedTinError>;
