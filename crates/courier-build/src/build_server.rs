//! Seam between the orchestrator and the HTTP build server.

use async_trait::async_trait;
use serde::Deserialize;

use crate::build_error::BuildServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Addresses one build of a job.
pub enum BuildRef {
    Number(u64),
    LastBuild,
}

impl BuildRef {
    pub fn as_path_segment(&self) -> String {
        match self {
            Self::Number(number) => number.to_string(),
            Self::LastBuild => "lastBuild".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QueueExecutable {
    pub number: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
/// Queue-item payload; `executable` appears once a build number is assigned.
pub struct QueueItemStatus {
    #[serde(default)]
    pub executable: Option<QueueExecutable>,
}

impl QueueItemStatus {
    pub fn assigned(number: u64) -> Self {
        Self {
            executable: Some(QueueExecutable { number }),
        }
    }

    /// Assigned build number; Jenkins numbers builds from 1, so 0 counts as unassigned.
    pub fn build_number(&self) -> Option<u64> {
        self.executable
            .as_ref()
            .map(|executable| executable.number)
            .filter(|number| *number > 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
/// Build status payload.
pub struct BuildStatus {
    #[serde(default)]
    pub building: bool,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub number: u64,
}

#[async_trait]
/// Trait contract for the build-server operations the orchestrator needs.
pub trait BuildServerApi: Send + Sync {
    /// Schedules a build and returns the queue location, when the server supplies one.
    async fn trigger_build(&self, job_path: &str) -> Result<Option<String>, BuildServerError>;

    async fn queue_item(&self, queue_location: &str) -> Result<QueueItemStatus, BuildServerError>;

    async fn build_status(
        &self,
        job_path: &str,
        build: BuildRef,
    ) -> Result<BuildStatus, BuildServerError>;

    async fn console_text(
        &self,
        job_path: &str,
        build_number: u64,
    ) -> Result<String, BuildServerError>;
}
