use thiserror::Error;

#[derive(Debug, Error)]
/// Failures reported by a build-server client.
pub enum BuildServerError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("build server returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
/// Failures surfaced by `BuildOrchestrator`.
pub enum BuildOrchestratorError {
    #[error("unknown job alias '{alias}', available: {available}")]
    UnknownJob { alias: String, available: String },
    #[error("failed to trigger build for '{alias}': {message}")]
    Trigger { alias: String, message: String },
    #[error("build server accepted '{alias}' but returned no queue location")]
    MissingQueueLocation { alias: String },
    #[error("queue item {queue_location} was not assigned a build after {attempts} polls")]
    QueueTimeout {
        queue_location: String,
        attempts: usize,
    },
    #[error("build {job_path} #{build_number} did not complete after {attempts} polls")]
    BuildTimeout {
        job_path: String,
        build_number: u64,
        attempts: usize,
    },
}

impl BuildOrchestratorError {
    /// True when the caller should try the last-completed-build read path.
    ///
    /// Only trigger-stage failures qualify; polling timeouts and unknown aliases do not.
    pub fn allows_last_build_fallback(&self) -> bool {
        matches!(
            self,
            Self::Trigger { .. } | Self::MissingQueueLocation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::BuildOrchestratorError;

    #[test]
    fn unit_unknown_job_message_lists_available_aliases() {
        let error = BuildOrchestratorError::UnknownJob {
            alias: "Nightly".to_string(),
            available: "Patch, Release".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "unknown job alias 'Nightly', available: Patch, Release"
        );
    }

    #[test]
    fn unit_only_trigger_stage_failures_allow_fallback() {
        let trigger = BuildOrchestratorError::Trigger {
            alias: "Patch".to_string(),
            message: "boom".to_string(),
        };
        let missing = BuildOrchestratorError::MissingQueueLocation {
            alias: "Patch".to_string(),
        };
        let queue_timeout = BuildOrchestratorError::QueueTimeout {
            queue_location: "q".to_string(),
            attempts: 60,
        };
        let build_timeout = BuildOrchestratorError::BuildTimeout {
            job_path: "A/B".to_string(),
            build_number: 1,
            attempts: 180,
        };
        let unknown = BuildOrchestratorError::UnknownJob {
            alias: "x".to_string(),
            available: String::new(),
        };
        assert!(trigger.allows_last_build_fallback());
        assert!(missing.allows_last_build_fallback());
        assert!(!queue_timeout.allows_last_build_fallback());
        assert!(!build_timeout.allows_last_build_fallback());
        assert!(!unknown.allows_last_build_fallback());
    }
}
