//! Command flows that connect the build orchestrator and assistant stream to chat.

use std::sync::Arc;

use anyhow::{bail, Result};
use courier_assistant::{ClaudeStreamConfig, ClaudeStreamSource};
use courier_build::{BuildOrchestrator, BuildResult, BuildSource};
use courier_core::StaticTextSource;
use courier_render::{
    render_text_stream, ChatClient, ChatMessageHandle, ChatTarget, RenderConfig, RenderSession,
    RenderState,
};

use crate::report_rendering::{
    render_analysis_running, render_build_report_prompt, render_build_running,
    render_build_summary, render_failure, render_trigger_ack, ANALYSIS_PLACEHOLDER,
    BUILD_REPORT_STARTING, BUILD_REPORT_TITLE, FALLBACK_NOTICE,
};

enum BuildLookup {
    Found(BuildResult, BuildSource),
    Unavailable(String),
}

/// Chat destination and render settings shared by every command of one invocation.
pub struct CourierRuntime {
    chat: Arc<dyn ChatClient>,
    target: ChatTarget,
    render: RenderConfig,
}

impl CourierRuntime {
    pub fn new(chat: Arc<dyn ChatClient>, target: ChatTarget, render: RenderConfig) -> Self {
        Self {
            chat,
            target,
            render,
        }
    }

    async fn post(&self, text: &str) -> Result<ChatMessageHandle> {
        self.chat
            .post_message(&self.target.channel, self.target.thread_ts.as_deref(), text)
            .await
    }

    fn attach(
        &self,
        primary: ChatMessageHandle,
        heading: Option<&str>,
        placeholder: &str,
    ) -> RenderSession {
        let mut config = self.render.clone();
        config.heading = heading.map(str::to_string);
        config.placeholder = placeholder.to_string();
        RenderSession::attach(self.chat.clone(), self.target.clone(), config, primary)
    }

    async fn report_failure(
        &self,
        primary: &ChatMessageHandle,
        message: &str,
    ) -> Result<RenderState> {
        self.chat
            .update_message(primary, &render_failure(message))
            .await?;
        Ok(RenderState::Failed)
    }

    /// Trigger-and-wait, reading the last completed build when the trigger stage fails.
    async fn lookup_build(
        &self,
        orchestrator: &BuildOrchestrator,
        alias: &str,
        primary: &ChatMessageHandle,
    ) -> Result<BuildLookup> {
        let error = match orchestrator.trigger_and_wait(alias).await {
            Ok(result) => return Ok(BuildLookup::Found(result, BuildSource::Triggered)),
            Err(error) => error,
        };
        if !error.allows_last_build_fallback() {
            tracing::warn!(alias, %error, "build failed without fallback");
            return Ok(BuildLookup::Unavailable(error.to_string()));
        }

        tracing::warn!(alias, %error, "trigger failed, reading last completed build");
        self.chat.update_message(primary, FALLBACK_NOTICE).await?;
        Ok(match orchestrator.get_last_completed_build(alias).await {
            Some(result) => BuildLookup::Found(result, BuildSource::LastCompleted),
            None => BuildLookup::Unavailable(format!(
                "no completed build available for '{alias}' ({error})"
            )),
        })
    }

    /// Triggers `alias` and acknowledges the queued build without waiting.
    pub async fn run_trigger(
        &self,
        orchestrator: &BuildOrchestrator,
        alias: &str,
    ) -> Result<RenderState> {
        match orchestrator.trigger(alias).await {
            Ok(job) => {
                self.post(&render_trigger_ack(&job)).await?;
                Ok(RenderState::Finished)
            }
            Err(error) => {
                tracing::warn!(alias, %error, "trigger failed");
                self.post(&render_failure(&error.to_string())).await?;
                Ok(RenderState::Failed)
            }
        }
    }

    pub async fn run_build(
        &self,
        orchestrator: &BuildOrchestrator,
        alias: &str,
        console_tail_chars: usize,
    ) -> Result<RenderState> {
        let primary = self.post(&render_build_running(alias)).await?;
        let (result, source) = match self.lookup_build(orchestrator, alias, &primary).await? {
            BuildLookup::Found(result, source) => (result, source),
            BuildLookup::Unavailable(message) => {
                return self.report_failure(&primary, &message).await
            }
        };
        let summary = render_build_summary(alias, &result, source, console_tail_chars);
        let mut session = self.attach(primary, None, &self.render.placeholder);
        render_text_stream(&mut session, &mut StaticTextSource::single(summary)).await
    }

    pub async fn run_last_build(
        &self,
        orchestrator: &BuildOrchestrator,
        alias: &str,
        console_tail_chars: usize,
    ) -> Result<RenderState> {
        let primary = self.post(&self.render.placeholder).await?;
        let Some(result) = orchestrator.get_last_completed_build(alias).await else {
            return self
                .report_failure(
                    &primary,
                    &format!("no completed build available for '{alias}'"),
                )
                .await;
        };
        let summary =
            render_build_summary(alias, &result, BuildSource::LastCompleted, console_tail_chars);
        let mut session = self.attach(primary, None, &self.render.placeholder);
        render_text_stream(&mut session, &mut StaticTextSource::single(summary)).await
    }

    /// Streams the assistant's answer to `prompt` into a fresh message.
    pub async fn run_brainstorm(
        &self,
        assistant: &ClaudeStreamConfig,
        prompt: &str,
    ) -> Result<RenderState> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            bail!("brainstorm prompt is empty");
        }
        let mut session =
            RenderSession::start(self.chat.clone(), self.target.clone(), self.render.clone())
                .await?;
        self.stream_assistant(&mut session, assistant, prompt).await
    }

    /// Runs `alias`, then streams an assistant analysis of its console output.
    pub async fn run_build_report(
        &self,
        orchestrator: &BuildOrchestrator,
        assistant: &ClaudeStreamConfig,
        alias: &str,
        console_tail_chars: usize,
    ) -> Result<RenderState> {
        let primary = self.post(BUILD_REPORT_STARTING).await?;
        self.chat
            .update_message(&primary, &render_build_running(alias))
            .await?;
        let result = match self.lookup_build(orchestrator, alias, &primary).await? {
            BuildLookup::Found(result, _) => result,
            BuildLookup::Unavailable(message) => {
                return self
                    .report_failure(&primary, &format!("build report failed: {message}"))
                    .await
            }
        };

        self.chat
            .update_message(&primary, &render_analysis_running())
            .await?;
        let prompt = render_build_report_prompt(alias, &result, console_tail_chars);
        let mut session = self.attach(primary, Some(BUILD_REPORT_TITLE), ANALYSIS_PLACEHOLDER);
        self.stream_assistant(&mut session, assistant, &prompt).await
    }

    async fn stream_assistant(
        &self,
        session: &mut RenderSession,
        assistant: &ClaudeStreamConfig,
        prompt: &str,
    ) -> Result<RenderState> {
        let mut source = match ClaudeStreamSource::spawn(assistant, prompt).await {
            Ok(source) => source,
            Err(error) => {
                tracing::warn!(%error, "assistant spawn failed");
                session.fail(&error).await?;
                return Ok(session.state());
            }
        };
        let state = render_text_stream(session, &mut source).await;
        source.terminate();
        state
    }
}
