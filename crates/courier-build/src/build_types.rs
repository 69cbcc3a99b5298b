use serde::{Deserialize, Serialize};

use crate::build_server::BuildStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One trigger attempt for a configured job alias.
pub struct BuildJob {
    pub alias: String,
    pub path: String,
    pub queue_location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Terminal outcome of a build.
pub enum BuildOutcome {
    Success,
    Failure,
    Aborted,
    Unstable,
}

impl BuildOutcome {
    /// Maps a Jenkins result code onto an outcome.
    ///
    /// `NOT_BUILT` counts as aborted; unrecognized codes count as failures.
    pub fn from_result_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => Self::Success,
            "UNSTABLE" => Self::Unstable,
            "ABORTED" | "NOT_BUILT" => Self::Aborted,
            "FAILURE" => Self::Failure,
            other => {
                tracing::warn!(result_code = other, "unrecognized build result code");
                Self::Failure
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Aborted => "aborted",
            Self::Unstable => "unstable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A completed build. Never constructed for a build that is still running.
pub struct BuildResult {
    pub job_path: String,
    pub build_number: u64,
    pub outcome: BuildOutcome,
    pub duration_ms: u64,
    pub console_output: String,
}

impl BuildResult {
    /// Builds a result from a status payload.
    ///
    /// `None` when the build is not terminal or `build_number` is 0, which is
    /// what a payload without a `number` field decodes to.
    pub fn from_terminal_status(
        job_path: &str,
        build_number: u64,
        status: &BuildStatus,
        console_output: String,
    ) -> Option<Self> {
        if status.building || build_number == 0 {
            return None;
        }
        let code = status.result.as_deref()?;
        Some(Self {
            job_path: job_path.to_string(),
            build_number,
            outcome: BuildOutcome::from_result_code(code),
            duration_ms: status.duration,
            console_output,
        })
    }
}

/// Where a reported build result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildSource {
    Triggered,
    LastCompleted,
}

#[cfg(test)]
mod tests {
    use super::{BuildOutcome, BuildResult};
    use crate::build_server::BuildStatus;

    fn status(building: bool, result: Option<&str>) -> BuildStatus {
        BuildStatus {
            building,
            result: result.map(str::to_string),
            duration: 1_234,
            number: 42,
        }
    }

    #[test]
    fn unit_build_outcome_maps_jenkins_result_codes() {
        assert_eq!(BuildOutcome::from_result_code("SUCCESS"), BuildOutcome::Success);
        assert_eq!(BuildOutcome::from_result_code("FAILURE"), BuildOutcome::Failure);
        assert_eq!(BuildOutcome::from_result_code("ABORTED"), BuildOutcome::Aborted);
        assert_eq!(BuildOutcome::from_result_code("UNSTABLE"), BuildOutcome::Unstable);
        assert_eq!(BuildOutcome::from_result_code("not_built"), BuildOutcome::Aborted);
        assert_eq!(BuildOutcome::from_result_code("WEIRD"), BuildOutcome::Failure);
    }

    #[test]
    fn unit_build_result_requires_terminal_status() {
        assert!(BuildResult::from_terminal_status("A/B", 42, &status(true, None), String::new())
            .is_none());
        assert!(
            BuildResult::from_terminal_status("A/B", 42, &status(true, Some("SUCCESS")), String::new())
                .is_none()
        );
        assert!(BuildResult::from_terminal_status("A/B", 42, &status(false, None), String::new())
            .is_none());

        let result = BuildResult::from_terminal_status(
            "A/B",
            42,
            &status(false, Some("SUCCESS")),
            "log".to_string(),
        )
        .expect("terminal result");
        assert_eq!(result.build_number, 42);
        assert_eq!(result.outcome, BuildOutcome::Success);
        assert_eq!(result.duration_ms, 1_234);
        assert_eq!(result.console_output, "log");
    }

    #[test]
    fn regression_build_result_rejects_build_number_zero() {
        assert!(BuildResult::from_terminal_status(
            "A/B",
            0,
            &status(false, Some("SUCCESS")),
            String::new()
        )
        .is_none());
    }
}
