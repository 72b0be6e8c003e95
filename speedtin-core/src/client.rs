// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Remote service client.
//!
//! [`RemoteService`] is the seam between the commit logic and the network:
//! the orchestrator only talks to the trait, and [`HttpRemoteService`] maps
//! each operation onto exactly one blocking HTTP call against the SpeedTin
//! REST API. Payloads are explicit request/response structs, checked at this
//! boundary before anything else sees them.
//!
//! No retries happen here. A failed call surfaces as a [`RemoteServiceError`].

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::RemoteServiceError;
use crate::types::{AuthKey, BenchmarkId, BenchmarkName, ProjectId};

/// Header carrying the authorization key.
pub const AUTH_HEADER: &str = "X-AuthToken";

/// Status returned by the service when an entity was created.
pub const STATUS_CREATED: u16 = 201;
/// Status returned by the service for successful reads.
pub const STATUS_OK: u16 = 200;

/// Body of `POST /api/projects/{project}/benchmarks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateBenchmarkRequest<'a> {
    pub name: &'a str,
}

/// A benchmark as reported by the service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BenchmarkInfo {
    pub id: BenchmarkId,
    pub name: String,
}

/// A project as reported by the service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectInfo {
    pub id: serde_json::Value,
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of `POST /api/projects/{project}/benchmarks/{id}/measurements`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementPayload {
    pub value: f64,
    pub version: String,
    pub released: bool,
    pub branch: String,
    pub os: String,
    pub commit_id: String,
    /// UTC, `%Y-%m-%d %H:%M:%S%.6f`, or empty.
    pub commit_date: String,
    pub machine_name: String,
    pub tag1: String,
    pub tag2: String,
}

/// Response to a measurement creation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeasurementReceipt {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// Operations the commit logic needs from the remote service.
pub trait RemoteService {
    /// Fetch the project the client is bound to. Projects are created from the
    /// dashboard; this confirms the id and the credentials are accepted.
    fn create_or_get_project(&self, project: &ProjectId) -> Result<ProjectInfo, RemoteServiceError>;

    /// Create a benchmark. The service deduplicates by name, so creating an
    /// existing benchmark yields its existing id.
    fn create_or_get_benchmark(
        &self,
        project: &ProjectId,
        name: &BenchmarkName,
    ) -> Result<BenchmarkInfo, RemoteServiceError>;

    /// Every benchmark of a project; used to resolve names by lookup.
    fn list_benchmarks(&self, project: &ProjectId) -> Result<Vec<BenchmarkInfo>, RemoteServiceError>;

    fn create_measurement(
        &self,
        project: &ProjectId,
        benchmark: BenchmarkId,
        measurement: &MeasurementPayload,
    ) -> Result<MeasurementReceipt, RemoteServiceError>;
}

impl<T: RemoteService + ?Sized> RemoteService for &T {
    fn create_or_get_project(&self, project: &ProjectId) -> Result<ProjectInfo, RemoteServiceError> {
        (**self).create_or_get_project(project)
    }

    fn create_or_get_benchmark(
        &self,
        project: &ProjectId,
        name: &BenchmarkName,
    ) -> Result<BenchmarkInfo, RemoteServiceError> {
        (**self).create_or_get_benchmark(project, name)
    }

    fn list_benchmarks(&self, project: &ProjectId) -> Result<Vec<BenchmarkInfo>, RemoteServiceError> {
        (**self).list_benchmarks(project)
    }

    fn create_measurement(
        &self,
        project: &ProjectId,
        benchmark: BenchmarkId,
        measurement: &MeasurementPayload,
    ) -> Result<MeasurementReceipt, RemoteServiceError> {
        (**self).create_measurement(project, benchmark, measurement)
    }
}

/// Blocking HTTP implementation of [`RemoteService`].
#[derive(Debug, Clone)]
pub struct HttpRemoteService {
    http: Client,
    base_url: String,
    authorization_key: AuthKey,
}

impl HttpRemoteService {
    /// Build a client from validated configuration. Redirects are not
    /// followed: the API answers directly or not at all.
    pub fn new(config: &ClientConfig) -> Result<Self, RemoteServiceError> {
        let mut builder = Client::builder().redirect(reqwest::redirect::Policy::none());
        if config.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.timeout_ms));
        }
        let http = builder.build().map_err(|e| {
            RemoteServiceError::transport("Failed to build HTTP client", &config.base_url, e.to_string())
        })?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            authorization_key: config.authorization_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn project_url(&self, project: &ProjectId) -> String {
        format!("{}/api/projects/{}", self.base_url, project)
    }

    fn benchmarks_url(&self, project: &ProjectId) -> String {
        format!("{}/benchmarks", self.project_url(project))
    }

    fn measurements_url(&self, project: &ProjectId, benchmark: BenchmarkId) -> String {
        format!("{}/{}/measurements", self.benchmarks_url(project), benchmark)
    }

    fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
        context: &str,
        expected_status: u16,
    ) -> Result<T, RemoteServiceError> {
        tracing::debug!(url = %url, "Sending request");

        let response = request
            .header(AUTH_HEADER, self.authorization_key.expose())
            .send()
            .map_err(|e| RemoteServiceError::transport(context, url, e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| RemoteServiceError::transport(context, url, e.to_string()))?;

        check_response(context, url, status, expected_status, &body)
    }
}

impl RemoteService for HttpRemoteService {
    fn create_or_get_project(&self, project: &ProjectId) -> Result<ProjectInfo, RemoteServiceError> {
        let url = self.project_url(project);
        self.execute(
            self.http.get(&url),
            &url,
            "Unable to get the project from the server",
            STATUS_OK,
        )
    }

    fn create_or_get_benchmark(
        &self,
        project: &ProjectId,
        name: &BenchmarkName,
    ) -> Result<BenchmarkInfo, RemoteServiceError> {
        let url = self.benchmarks_url(project);
        let body = CreateBenchmarkRequest { name: name.as_str() };
        self.execute(
            self.http.post(&url).json(&body),
            &url,
            "It was not possible to create the benchmark",
            STATUS_CREATED,
        )
    }

    fn list_benchmarks(&self, project: &ProjectId) -> Result<Vec<BenchmarkInfo>, RemoteServiceError> {
        let url = self.benchmarks_url(project);
        self.execute(
            self.http.get(&url),
            &url,
            "Unable to get the benchmarks from the server",
            STATUS_OK,
        )
    }

    fn create_measurement(
        &self,
        project: &ProjectId,
        benchmark: BenchmarkId,
        measurement: &MeasurementPayload,
    ) -> Result<MeasurementReceipt, RemoteServiceError> {
        let url = self.measurements_url(project, benchmark);
        self.execute(
            self.http.post(&url).json(measurement),
            &url,
            "It was not possible to create the measurement",
            STATUS_CREATED,
        )
    }
}

/// Validate a raw response: status must match exactly, the body must be JSON
/// without an `"error"` key, and it must have the expected shape.
pub fn check_response<T: DeserializeOwned>(
    context: &str,
    url: &str,
    status: u16,
    expected_status: u16,
    body: &str,
) -> Result<T, RemoteServiceError> {
    if status != expected_status {
        return Err(RemoteServiceError::status(
            format!("{}. Expected status: {}", context, expected_status),
            url,
            status,
            body,
        ));
    }

    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        RemoteServiceError::status(format!("{}. Invalid JSON: {}", context, e), url, status, body)
    })?;

    if value.get("error").is_some() {
        return Err(RemoteServiceError::status(context, url, status, body));
    }

    serde_json::from_value(value).map_err(|e| {
        RemoteServiceError::status(
            format!("{}. Unexpected response shape: {}", context, e),
            url,
            status,
            body,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.speedtin.com/api/projects/6546546/benchmarks";

    fn service() -> HttpRemoteService {
        let config = ClientConfig::new(
            AuthKey::new("dummy_auth_key").unwrap(),
            ProjectId::new("6546546").unwrap(),
        );
        HttpRemoteService::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        let service = service();
        let project = ProjectId::new("6546546").unwrap();
        assert_eq!(
            service.project_url(&project),
            "https://www.speedtin.com/api/projects/6546546"
        );
        assert_eq!(service.benchmarks_url(&project), URL);
        assert_eq!(
            service.measurements_url(&project, BenchmarkId::new(1)),
            "https://www.speedtin.com/api/projects/6546546/benchmarks/1/measurements"
        );
    }

    #[test]
    fn test_check_response_created() {
        let info: BenchmarkInfo = check_response(
            "create",
            URL,
            201,
            STATUS_CREATED,
            r#"{"id": 0, "name": "create_10_users"}"#,
        )
        .unwrap();
        assert_eq!(info.id, BenchmarkId::new(0));
        assert_eq!(info.name, "create_10_users");
    }

    #[test]
    fn test_check_response_wrong_status() {
        let err = check_response::<BenchmarkInfo>("create", URL, 200, STATUS_CREATED, "{}")
            .unwrap_err();
        assert_eq!(err.status, Some(200));
        assert!(err.context.contains("Expected status: 201"));

        let err = check_response::<BenchmarkInfo>("create", URL, 401, STATUS_CREATED, "denied")
            .unwrap_err();
        assert_eq!(err.status, Some(401));
        assert_eq!(err.body, "denied");
    }

    #[test]
    fn test_check_response_error_payload() {
        let err = check_response::<BenchmarkInfo>(
            "create",
            URL,
            201,
            STATUS_CREATED,
            r#"{"error": "name too long"}"#,
        )
        .unwrap_err();
        assert!(err.body.contains("name too long"));
    }

    #[test]
    fn test_check_response_bad_shape() {
        let err = check_response::<Vec<BenchmarkInfo>>("list", URL, 200, STATUS_OK, r#"{"id": 1}"#)
            .unwrap_err();
        assert!(err.context.contains("Unexpected response shape"));

        let err = check_response::<Vec<BenchmarkInfo>>("list", URL, 200, STATUS_OK, "<html>")
            .unwrap_err();
        assert!(err.context.contains("Invalid JSON"));
    }

    #[test]
    fn test_list_payload_with_string_ids() {
        let list: Vec<BenchmarkInfo> = check_response(
            "list",
            URL,
            200,
            STATUS_OK,
            r#"[{"id": "0", "name": "a"}, {"id": 1, "name": "b"}]"#,
        )
        .unwrap();
        assert_eq!(list[0].id, BenchmarkId::new(0));
        assert_eq!(list[1].id, BenchmarkId::new(1));
    }

    #[test]
    fn test_create_benchmark_request_shape() {
        let body = serde_json::to_value(CreateBenchmarkRequest { name: "bench" }).unwrap();
        assert_eq!(body, serde_json::json!({"name": "bench"}));
    }
}
