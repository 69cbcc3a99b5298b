use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

pub(crate) const DEFAULT_BUILD_REPORT_ALIAS: &str = "GetPlayfabData";

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "courier",
    about = "Relays build and assistant commands into a chat thread",
    version
)]
pub struct Cli {
    #[arg(
        long = "jenkins-url",
        env = "JENKINS_URL",
        default_value = "https://jenkins.example.com",
        help = "Base URL of the Jenkins server."
    )]
    pub jenkins_url: String,

    #[arg(long = "jenkins-user", env = "JENKINS_USER", default_value = "")]
    pub jenkins_user: String,

    #[arg(
        long = "jenkins-token",
        env = "JENKINS_TOKEN",
        default_value = "",
        hide_env_values = true,
        help = "Jenkins API token used for Basic-Auth."
    )]
    pub jenkins_token: String,

    #[arg(
        long = "jenkins-jobs",
        env = "JENKINS_JOBS",
        help = "JSON object mapping job aliases to job paths, e.g. {\"Patch\":\"MyProject/Patch_Build\"}."
    )]
    pub jenkins_jobs: Option<String>,

    #[arg(
        long = "jenkins-request-timeout-ms",
        env = "COURIER_JENKINS_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = parse_positive_u64
    )]
    pub jenkins_request_timeout_ms: u64,

    #[arg(
        long = "slack-api-base",
        env = "SLACK_API_BASE",
        default_value = "https://slack.com/api"
    )]
    pub slack_api_base: String,

    #[arg(
        long = "slack-bot-token",
        env = "SLACK_BOT_TOKEN",
        default_value = "",
        hide_env_values = true
    )]
    pub slack_bot_token: String,

    #[arg(
        long = "slack-request-timeout-ms",
        env = "COURIER_SLACK_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = parse_positive_u64
    )]
    pub slack_request_timeout_ms: u64,

    #[arg(
        long = "slack-retry-max-attempts",
        env = "COURIER_SLACK_RETRY_MAX_ATTEMPTS",
        default_value_t = 4,
        value_parser = parse_positive_usize
    )]
    pub slack_retry_max_attempts: usize,

    #[arg(
        long = "slack-retry-base-delay-ms",
        env = "COURIER_SLACK_RETRY_BASE_DELAY_MS",
        default_value_t = 500,
        value_parser = parse_positive_u64
    )]
    pub slack_retry_base_delay_ms: u64,

    #[arg(
        long,
        env = "COURIER_CHANNEL",
        help = "Chat channel that receives command output."
    )]
    pub channel: String,

    #[arg(
        long = "thread-ts",
        env = "COURIER_THREAD_TS",
        help = "Thread timestamp to reply into; continuations thread under the primary message when unset."
    )]
    pub thread_ts: Option<String>,

    #[arg(long = "claude-command", env = "CLAUDE_COMMAND", default_value = "claude")]
    pub claude_command: String,

    #[arg(
        long = "claude-timeout-ms",
        env = "CLAUDE_TIMEOUT_MS",
        default_value_t = 300_000,
        value_parser = parse_positive_u64
    )]
    pub claude_timeout_ms: u64,

    #[arg(long = "anthropic-base-url", env = "ANTHROPIC_BASE_URL")]
    pub anthropic_base_url: Option<String>,

    #[arg(
        long = "anthropic-auth-token",
        env = "ANTHROPIC_AUTH_TOKEN",
        hide_env_values = true
    )]
    pub anthropic_auth_token: Option<String>,

    #[arg(
        long = "claude-project-dir",
        env = "CLAUDE_PROJECT_DIR",
        help = "Working directory for the assistant subprocess."
    )]
    pub claude_project_dir: Option<PathBuf>,

    #[arg(
        long = "claude-skip-permissions",
        env = "CLAUDE_DANGEROUSLY_SKIP_PERMISSIONS",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        help = "Pass --dangerously-skip-permissions to the assistant CLI."
    )]
    pub claude_skip_permissions: bool,

    #[arg(
        long = "claude-arg",
        env = "CLAUDE_EXTRA_ARGS",
        value_delimiter = ',',
        allow_hyphen_values = true,
        help = "Extra argument(s) appended to the assistant CLI invocation, e.g. --claude-arg=--model,sonnet"
    )]
    pub claude_args: Vec<String>,

    #[arg(
        long = "max-message-chars",
        env = "COURIER_MAX_MESSAGE_CHARS",
        default_value_t = 3_800,
        value_parser = parse_positive_usize
    )]
    pub max_message_chars: usize,

    #[arg(
        long = "render-throttle-ms",
        env = "COURIER_RENDER_THROTTLE_MS",
        default_value_t = 500,
        value_parser = parse_positive_u64
    )]
    pub render_throttle_ms: u64,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum CliCommand {
    /// Trigger a build and report its queue location without waiting.
    Trigger { alias: String },
    /// Trigger a build, wait for it, and post its result.
    Build {
        alias: String,
        #[arg(long = "console-tail-chars", default_value_t = 3_000, value_parser = parse_positive_usize)]
        console_tail_chars: usize,
    },
    /// Post the most recent completed build without triggering.
    LastBuild {
        alias: String,
        #[arg(long = "console-tail-chars", default_value_t = 3_000, value_parser = parse_positive_usize)]
        console_tail_chars: usize,
    },
    /// Stream an assistant answer for a free-form prompt.
    Brainstorm {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// Run a build and stream an assistant analysis of its console output.
    BuildReport {
        #[arg(long, default_value = DEFAULT_BUILD_REPORT_ALIAS)]
        alias: String,
        #[arg(long = "console-tail-chars", default_value_t = 8_000, value_parser = parse_positive_usize)]
        console_tail_chars: usize,
    },
}
