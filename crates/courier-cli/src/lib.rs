//! `courier` command-line entrypoint and command flows.
//!
//! Parses CLI/environment configuration into explicit per-crate config values,
//! then runs one command per invocation: build triggers and waits against
//! Jenkins, last-build reads, and assistant streams rendered into Slack.

mod bootstrap_helpers;
mod cli_args;
mod command_flows;
mod report_rendering;
mod startup_config;

use std::sync::Arc;

use anyhow::Result;
use courier_build::{BuildOrchestrator, JenkinsClient};
use courier_render::{ChatClient, ChatTarget, RenderState, SlackChatClient};

pub use bootstrap_helpers::init_tracing;
pub use cli_args::{Cli, CliCommand};
pub use command_flows::CourierRuntime;
pub use report_rendering::{
    render_build_report_prompt, render_build_summary, render_trigger_ack, BUILD_REPORT_TITLE,
};
pub use startup_config::{
    claude_stream_config, jenkins_config, render_config, resolve_job_table, slack_chat_config,
};

fn build_orchestrator(cli: &Cli) -> Result<BuildOrchestrator> {
    let config = jenkins_config(cli)?;
    let client = JenkinsClient::new(&config)?;
    Ok(BuildOrchestrator::new(Arc::new(client), config.jobs))
}

/// Runs the parsed command and returns the terminal render state it posted.
pub async fn run_cli(cli: Cli) -> Result<RenderState> {
    let chat: Arc<dyn ChatClient> = Arc::new(SlackChatClient::new(&slack_chat_config(&cli)?)?);
    let runtime = CourierRuntime::new(
        chat,
        ChatTarget::new(cli.channel.trim(), cli.thread_ts.clone()),
        render_config(&cli),
    );

    match &cli.command {
        CliCommand::Trigger { alias } => runtime.run_trigger(&build_orchestrator(&cli)?, alias).await,
        CliCommand::Build {
            alias,
            console_tail_chars,
        } => {
            runtime
                .run_build(&build_orchestrator(&cli)?, alias, *console_tail_chars)
                .await
        }
        CliCommand::LastBuild {
            alias,
            console_tail_chars,
        } => {
            runtime
                .run_last_build(&build_orchestrator(&cli)?, alias, *console_tail_chars)
                .await
        }
        CliCommand::Brainstorm { prompt } => {
            runtime
                .run_brainstorm(&claude_stream_config(&cli), &prompt.join(" "))
                .await
        }
        CliCommand::BuildReport {
            alias,
            console_tail_chars,
        } => {
            runtime
                .run_build_report(
                    &build_orchestrator(&cli)?,
                    &claude_stream_config(&cli),
                    alias,
                    *console_tail_chars,
                )
                .await
        }
    }
}
