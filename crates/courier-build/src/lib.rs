//! Remote build orchestration for courier.
//!
//! Triggers jobs on a Jenkins-compatible build server, resolves queue items to
//! concrete builds, polls them to a terminal state under fixed budgets, and
//! exposes the non-triggering last-completed-build fallback read path.

mod build_error;
mod build_orchestrator;
mod build_server;
mod build_types;
mod jenkins_client;

pub use build_error::{BuildOrchestratorError, BuildServerError};
pub use build_orchestrator::{
    BuildOrchestrator, PollSchedule, BUILD_POLL_INTERVAL, BUILD_POLL_MAX_ATTEMPTS,
    QUEUE_POLL_INTERVAL, QUEUE_POLL_MAX_ATTEMPTS,
};
pub use build_server::{BuildRef, BuildServerApi, BuildStatus, QueueItemStatus};
pub use build_types::{BuildJob, BuildOutcome, BuildResult, BuildSource};
pub use jenkins_client::{default_job_table, JenkinsClient, JenkinsConfig};
