//! Jenkins REST client used by the build orchestrator.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use courier_core::truncate_for_error;
use serde::de::DeserializeOwned;

use crate::build_error::BuildServerError;
use crate::build_server::{BuildRef, BuildServerApi, BuildStatus, QueueItemStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JenkinsConfig {
    pub base_url: String,
    pub user: String,
    pub token: String,
    /// Alias to job path, e.g. `Patch` -> `MyProject/Patch_Build`.
    pub jobs: BTreeMap<String, String>,
    pub request_timeout_ms: u64,
}

/// Job table used when none is configured.
pub fn default_job_table() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Patch".to_string(), "MyProject/Patch_Build".to_string()),
        ("Release".to_string(), "MyProject/Release_Build".to_string()),
    ])
}

#[derive(Debug, Clone)]
pub struct JenkinsClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
    token: String,
}

impl JenkinsClient {
    pub fn new(config: &JenkinsConfig) -> Result<Self, BuildServerError> {
        if config.base_url.trim().is_empty() {
            return Err(BuildServerError::InvalidResponse(
                "jenkins base url is empty".to_string(),
            ));
        }
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("courier-build-orchestrator"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            user: config.user.trim().to_string(),
            token: config.token.trim().to_string(),
        })
    }

    /// `MyProject/Patch_Build` -> `{base}/job/MyProject/job/Patch_Build`.
    pub fn job_url(&self, job_path: &str) -> String {
        format!(
            "{}/job/{}",
            self.base_url,
            job_path.trim_matches('/').replace('/', "/job/")
        )
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .basic_auth(&self.user, Some(&self.token))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, BuildServerError> {
        let response = ensure_success(self.get(url).send().await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|error| BuildServerError::InvalidResponse(format!("{url}: {error}")))
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BuildServerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BuildServerError::HttpStatus {
        status: status.as_u16(),
        body: truncate_for_error(body.trim(), 400),
    })
}

#[async_trait]
impl BuildServerApi for JenkinsClient {
    async fn trigger_build(&self, job_path: &str) -> Result<Option<String>, BuildServerError> {
        let url = format!("{}/build", self.job_url(job_path));
        tracing::debug!(job_path, url = url.as_str(), "triggering build");
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.user, Some(&self.token))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let queue_location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Ok(queue_location)
    }

    async fn queue_item(&self, queue_location: &str) -> Result<QueueItemStatus, BuildServerError> {
        let url = format!("{}/api/json", queue_location.trim().trim_end_matches('/'));
        self.get_json(&url).await
    }

    async fn build_status(
        &self,
        job_path: &str,
        build: BuildRef,
    ) -> Result<BuildStatus, BuildServerError> {
        let url = format!(
            "{}/{}/api/json",
            self.job_url(job_path),
            build.as_path_segment()
        );
        self.get_json(&url).await
    }

    async fn console_text(
        &self,
        job_path: &str,
        build_number: u64,
    ) -> Result<String, BuildServerError> {
        let url = format!("{}/{build_number}/consoleText", self.job_url(job_path));
        let response = ensure_success(self.get(&url).send().await?).await?;
        Ok(response.text().await?)
    }
}
