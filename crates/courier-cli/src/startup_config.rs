//! Converts parsed CLI flags into the explicit config values each crate takes.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use courier_assistant::ClaudeStreamConfig;
use courier_build::{default_job_table, JenkinsConfig};
use courier_core::truncate_for_error;
use courier_render::{RenderConfig, SlackChatConfig, DEFAULT_PLACEHOLDER};

use crate::cli_args::Cli;

/// Parses `JENKINS_JOBS`, falling back to the built-in table when unset or blank.
pub fn resolve_job_table(raw: Option<&str>) -> Result<BTreeMap<String, String>> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(default_job_table());
    };
    let jobs: BTreeMap<String, String> = serde_json::from_str(raw)
        .with_context(|| format!("invalid JSON for JENKINS_JOBS: {}", truncate_for_error(raw, 200)))?;
    if jobs.is_empty() {
        bail!("JENKINS_JOBS must map at least one alias");
    }
    if let Some((alias, _)) = jobs.iter().find(|(_, path)| path.trim().is_empty()) {
        bail!("JENKINS_JOBS alias '{alias}' has an empty job path");
    }
    Ok(jobs)
}

pub fn jenkins_config(cli: &Cli) -> Result<JenkinsConfig> {
    if cli.jenkins_user.trim().is_empty() {
        bail!("JENKINS_USER is required for build commands");
    }
    if cli.jenkins_token.trim().is_empty() {
        bail!("JENKINS_TOKEN is required for build commands");
    }
    Ok(JenkinsConfig {
        base_url: cli.jenkins_url.clone(),
        user: cli.jenkins_user.clone(),
        token: cli.jenkins_token.clone(),
        jobs: resolve_job_table(cli.jenkins_jobs.as_deref())?,
        request_timeout_ms: cli.jenkins_request_timeout_ms,
    })
}

pub fn slack_chat_config(cli: &Cli) -> Result<SlackChatConfig> {
    if cli.slack_bot_token.trim().is_empty() {
        bail!("SLACK_BOT_TOKEN is required");
    }
    if cli.channel.trim().is_empty() {
        bail!("--channel must not be empty");
    }
    Ok(SlackChatConfig {
        api_base: cli.slack_api_base.clone(),
        bot_token: cli.slack_bot_token.clone(),
        request_timeout_ms: cli.slack_request_timeout_ms,
        retry_max_attempts: cli.slack_retry_max_attempts,
        retry_base_delay_ms: cli.slack_retry_base_delay_ms,
    })
}

pub fn claude_stream_config(cli: &Cli) -> ClaudeStreamConfig {
    let non_empty = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    ClaudeStreamConfig {
        command: cli.claude_command.trim().to_string(),
        timeout_ms: cli.claude_timeout_ms,
        anthropic_base_url: non_empty(&cli.anthropic_base_url),
        anthropic_auth_token: non_empty(&cli.anthropic_auth_token),
        project_dir: cli.claude_project_dir.clone(),
        skip_permissions: cli.claude_skip_permissions,
        extra_args: cli
            .claude_args
            .iter()
            .map(|arg| arg.trim())
            .filter(|arg| !arg.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

pub fn render_config(cli: &Cli) -> RenderConfig {
    RenderConfig {
        max_message_chars: cli.max_message_chars,
        throttle: Duration::from_millis(cli.render_throttle_ms),
        placeholder: DEFAULT_PLACEHOLDER.to_string(),
        heading: None,
    }
}
