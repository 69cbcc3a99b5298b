//! Throttled, size-aware rendering of a text stream into a chat thread.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use courier_core::{char_count, TextFragmentSource};
use tokio::time::Instant;

use crate::chat_client::{ChatClient, ChatMessageHandle, ChatTarget};
use crate::segment_split::{split_into_segments, DEFAULT_MAX_MESSAGE_CHARS};

pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(500);
pub const DEFAULT_PLACEHOLDER: &str = "thinking...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub max_message_chars: usize,
    /// Minimum spacing between throttled flushes.
    pub throttle: Duration,
    /// Shown in the primary message while no text has arrived.
    pub placeholder: String,
    /// Prefixed to the primary message on every update, followed by a blank
    /// line. Splitting counts only the streamed body against
    /// `max_message_chars`, so the primary message may exceed it by the
    /// heading length plus two; keep headings short.
    pub heading: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
            throttle: DEFAULT_THROTTLE,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            heading: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Streaming,
    Finished,
    Failed,
}

/// Renders accumulated text into one primary message plus frozen thread continuations.
///
/// Segment 0 lives in the primary message and is edited on every flush.
/// Continuation segments are posted once and never edited afterwards, even if
/// a later flush would split the same region differently.
pub struct RenderSession {
    chat: Arc<dyn ChatClient>,
    target: ChatTarget,
    config: RenderConfig,
    primary: ChatMessageHandle,
    accumulated: String,
    last_flush: Option<Instant>,
    posted_continuations: usize,
    flush_count: usize,
    state: RenderState,
}

impl RenderSession {
    /// Posts the placeholder message and starts streaming into it.
    pub async fn start(
        chat: Arc<dyn ChatClient>,
        target: ChatTarget,
        config: RenderConfig,
    ) -> Result<Self> {
        let initial = with_heading(config.heading.as_deref(), &config.placeholder);
        let primary = chat
            .post_message(&target.channel, target.thread_ts.as_deref(), &initial)
            .await?;
        Ok(Self::attach(chat, target, config, primary))
    }

    /// Starts streaming into a message that was already posted.
    pub fn attach(
        chat: Arc<dyn ChatClient>,
        target: ChatTarget,
        config: RenderConfig,
        primary: ChatMessageHandle,
    ) -> Self {
        Self {
            chat,
            target,
            config,
            primary,
            accumulated: String::new(),
            last_flush: None,
            posted_continuations: 0,
            flush_count: 0,
            state: RenderState::Streaming,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn accumulated_text(&self) -> &str {
        &self.accumulated
    }

    pub fn primary_message(&self) -> &ChatMessageHandle {
        &self.primary
    }

    pub fn posted_continuations(&self) -> usize {
        self.posted_continuations
    }

    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    /// Buffers `fragment` and flushes unless the last flush was within the throttle window.
    pub async fn append(&mut self, fragment: &str) -> Result<()> {
        if self.state != RenderState::Streaming {
            bail!("render session is closed ({:?})", self.state);
        }
        self.accumulated.push_str(fragment);
        let now = Instant::now();
        if let Some(last_flush) = self.last_flush {
            if now.duration_since(last_flush) < self.config.throttle {
                return Ok(());
            }
        }
        self.flush(now).await
    }

    /// Renders the final text regardless of the throttle window. Later calls are no-ops.
    pub async fn finish(&mut self) -> Result<()> {
        if self.state != RenderState::Streaming {
            return Ok(());
        }
        self.flush(Instant::now()).await?;
        self.state = RenderState::Finished;
        Ok(())
    }

    /// Annotates the accumulated text with `error` and renders it. Later calls are no-ops.
    pub async fn fail(&mut self, error: impl Display) -> Result<()> {
        if self.state != RenderState::Streaming {
            return Ok(());
        }
        self.state = RenderState::Failed;
        tracing::warn!(channel = self.target.channel.as_str(), %error, "render stream failed");
        self.accumulated = annotate_failure(&self.accumulated, &error.to_string());
        self.flush(Instant::now()).await
    }

    async fn flush(&mut self, now: Instant) -> Result<()> {
        self.last_flush = Some(now);
        self.flush_count = self.flush_count.saturating_add(1);
        let heading = self.config.heading.as_deref();
        let max_chars = self.config.max_message_chars.max(1);

        if char_count(&self.accumulated) <= max_chars {
            let body = if self.accumulated.is_empty() {
                self.config.placeholder.as_str()
            } else {
                self.accumulated.as_str()
            };
            self.chat
                .update_message(&self.primary, &with_heading(heading, body))
                .await?;
            return Ok(());
        }

        let segments = split_into_segments(&self.accumulated, max_chars);
        self.chat
            .update_message(&self.primary, &with_heading(heading, &segments[0]))
            .await?;

        let thread_ts = self
            .target
            .thread_ts
            .clone()
            .unwrap_or_else(|| self.primary.ts.clone());
        for segment in segments.iter().skip(1 + self.posted_continuations) {
            self.chat
                .post_message(&self.primary.channel, Some(&thread_ts), segment)
                .await?;
            self.posted_continuations += 1;
        }
        tracing::debug!(
            segments = segments.len(),
            posted_continuations = self.posted_continuations,
            "render flush split output"
        );
        Ok(())
    }
}

fn with_heading(heading: Option<&str>, body: &str) -> String {
    match heading {
        Some(heading) => format!("{heading}\n\n{body}"),
        None => body.to_string(),
    }
}

fn annotate_failure(accumulated: &str, message: &str) -> String {
    if accumulated.is_empty() {
        format!("error: {message}")
    } else {
        format!("{accumulated}\n\n_(error: {message})_")
    }
}

/// Drains `source` into `session`, rendering stream and chat failures into the chat.
///
/// A failed chat update ends the session through `fail`; the chat error is only
/// returned when that final annotated update fails too.
pub async fn render_text_stream(
    session: &mut RenderSession,
    source: &mut dyn TextFragmentSource,
) -> Result<RenderState> {
    loop {
        let rendered = match source.next_fragment().await {
            Ok(Some(fragment)) => session.append(&fragment).await,
            Ok(None) => match session.finish().await {
                Ok(()) => break,
                Err(error) => Err(error),
            },
            Err(error) => {
                session.fail(format!("{error:#}")).await?;
                break;
            }
        };
        if let Err(error) = rendered {
            if let Err(annotate_error) = session.fail(format!("{error:#}")).await {
                return Err(error.context(format!(
                    "failure annotation was not rendered: {annotate_error:#}"
                )));
            }
            break;
        }
    }
    Ok(session.state())
}
