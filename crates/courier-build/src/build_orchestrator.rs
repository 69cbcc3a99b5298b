//! Drives a remote build from trigger to completion.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::build_error::BuildOrchestratorError;
use crate::build_server::{BuildRef, BuildServerApi};
use crate::build_types::{BuildJob, BuildResult};

pub const QUEUE_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const QUEUE_POLL_MAX_ATTEMPTS: usize = 60;
pub const BUILD_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const BUILD_POLL_MAX_ATTEMPTS: usize = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Fixed-delay polling budget.
pub struct PollSchedule {
    pub interval: Duration,
    pub max_attempts: usize,
}

impl PollSchedule {
    pub const fn queue() -> Self {
        Self {
            interval: QUEUE_POLL_INTERVAL,
            max_attempts: QUEUE_POLL_MAX_ATTEMPTS,
        }
    }

    pub const fn build() -> Self {
        Self {
            interval: BUILD_POLL_INTERVAL,
            max_attempts: BUILD_POLL_MAX_ATTEMPTS,
        }
    }
}

#[derive(Clone)]
pub struct BuildOrchestrator {
    server: Arc<dyn BuildServerApi>,
    jobs: BTreeMap<String, String>,
    queue_schedule: PollSchedule,
    build_schedule: PollSchedule,
}

impl BuildOrchestrator {
    pub fn new(server: Arc<dyn BuildServerApi>, jobs: BTreeMap<String, String>) -> Self {
        Self {
            server,
            jobs,
            queue_schedule: PollSchedule::queue(),
            build_schedule: PollSchedule::build(),
        }
    }

    pub fn with_poll_schedules(mut self, queue: PollSchedule, build: PollSchedule) -> Self {
        self.queue_schedule = queue;
        self.build_schedule = build;
        self
    }

    pub fn job_path(&self, alias: &str) -> Option<&str> {
        self.jobs.get(alias).map(String::as_str)
    }

    fn lookup_job(&self, alias: &str) -> Result<&str, BuildOrchestratorError> {
        self.job_path(alias)
            .ok_or_else(|| BuildOrchestratorError::UnknownJob {
                alias: alias.to_string(),
                available: self.jobs.keys().cloned().collect::<Vec<_>>().join(", "),
            })
    }

    /// Schedules one new build for `alias`. Repeated calls schedule distinct builds.
    pub async fn trigger(&self, alias: &str) -> Result<BuildJob, BuildOrchestratorError> {
        let path = self.lookup_job(alias)?;
        let queue_location = self.server.trigger_build(path).await.map_err(|error| {
            BuildOrchestratorError::Trigger {
                alias: alias.to_string(),
                message: error.to_string(),
            }
        })?;
        tracing::info!(
            alias,
            job_path = path,
            queue_location = queue_location.as_deref().unwrap_or("none"),
            "build triggered"
        );
        Ok(BuildJob {
            alias: alias.to_string(),
            path: path.to_string(),
            queue_location,
        })
    }

    /// Polls the queue item until it is assigned a build number.
    ///
    /// Poll errors count as "not yet assigned" and consume one attempt.
    pub async fn resolve_build_number(
        &self,
        queue_location: &str,
    ) -> Result<u64, BuildOrchestratorError> {
        let schedule = self.queue_schedule;
        for attempt in 1..=schedule.max_attempts {
            match self.server.queue_item(queue_location).await {
                Ok(item) => {
                    if let Some(number) = item.build_number() {
                        tracing::debug!(queue_location, attempt, number, "queue item assigned");
                        return Ok(number);
                    }
                }
                Err(error) => {
                    tracing::debug!(queue_location, attempt, %error, "queue poll failed");
                }
            }
            if attempt < schedule.max_attempts {
                tokio::time::sleep(schedule.interval).await;
            }
        }
        Err(BuildOrchestratorError::QueueTimeout {
            queue_location: queue_location.to_string(),
            attempts: schedule.max_attempts,
        })
    }

    /// Polls a build until it reports a terminal state, then fetches its console text.
    pub async fn wait_for_completion(
        &self,
        job_path: &str,
        build_number: u64,
    ) -> Result<BuildResult, BuildOrchestratorError> {
        let schedule = self.build_schedule;
        for attempt in 1..=schedule.max_attempts {
            match self
                .server
                .build_status(job_path, BuildRef::Number(build_number))
                .await
            {
                Ok(status) if !status.building && status.result.is_some() => {
                    let console_output = self.console_or_empty(job_path, build_number).await;
                    if let Some(result) = BuildResult::from_terminal_status(
                        job_path,
                        build_number,
                        &status,
                        console_output,
                    ) {
                        tracing::info!(
                            job_path,
                            build_number,
                            outcome = result.outcome.as_str(),
                            attempt,
                            "build completed"
                        );
                        return Ok(result);
                    }
                }
                Ok(_) => {
                    tracing::debug!(job_path, build_number, attempt, "build still running");
                }
                Err(error) => {
                    tracing::debug!(job_path, build_number, attempt, %error, "build poll failed");
                }
            }
            if attempt < schedule.max_attempts {
                tokio::time::sleep(schedule.interval).await;
            }
        }
        Err(BuildOrchestratorError::BuildTimeout {
            job_path: job_path.to_string(),
            build_number,
            attempts: schedule.max_attempts,
        })
    }

    pub async fn trigger_and_wait(&self, alias: &str) -> Result<BuildResult, BuildOrchestratorError> {
        let job = self.trigger(alias).await?;
        let queue_location =
            job.queue_location
                .ok_or_else(|| BuildOrchestratorError::MissingQueueLocation {
                    alias: alias.to_string(),
                })?;
        let build_number = self.resolve_build_number(&queue_location).await?;
        self.wait_for_completion(&job.path, build_number).await
    }

    /// Reads the most recent build without triggering one.
    ///
    /// Returns `None` for an unknown alias, a failed fetch, or a build that is
    /// still running or has no result yet.
    pub async fn get_last_completed_build(&self, alias: &str) -> Option<BuildResult> {
        let Some(job_path) = self.job_path(alias) else {
            tracing::debug!(alias, "last build lookup for unknown alias");
            return None;
        };
        let status = match self.server.build_status(job_path, BuildRef::LastBuild).await {
            Ok(status) => status,
            Err(error) => {
                tracing::warn!(alias, job_path, %error, "last build fetch failed");
                return None;
            }
        };
        if status.building || status.result.is_none() || status.number == 0 {
            tracing::debug!(alias, job_path, number = status.number, "last build not completed");
            return None;
        }
        let console_output = self.console_or_empty(job_path, status.number).await;
        BuildResult::from_terminal_status(job_path, status.number, &status, console_output)
    }

    async fn console_or_empty(&self, job_path: &str, build_number: u64) -> String {
        match self.server.console_text(job_path, build_number).await {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(job_path, build_number, %error, "console fetch failed");
                String::new()
            }
        }
    }
}
