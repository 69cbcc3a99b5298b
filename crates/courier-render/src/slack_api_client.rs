//! Slack Web API client for posting and editing chat messages.
//!
//! `chat.update` replaces a message's text wholesale, so it is re-sent on
//! rate limits, server errors, and transport failures. `chat.postMessage` is
//! not: a re-sent post that already landed would duplicate a frozen thread
//! continuation, so it is only re-sent when Slack provably never accepted it
//! (a 429, or a connection that was never established).

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use courier_core::truncate_for_error;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::chat_client::{ChatClient, ChatMessageHandle};

const ATTEMPT_HEADER: &str = "x-courier-retry-attempt";
/// Longest `Retry-After` honored; a render session should not stall longer.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);
/// Backoff stops doubling after this many doublings.
const MAX_BACKOFF_DOUBLINGS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackChatConfig {
    pub api_base: String,
    pub bot_token: String,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackChatMessageResponse {
    ok: bool,
    ts: Option<String>,
    channel: Option<String>,
    error: Option<String>,
}

/// Which failures a chat method may be re-sent after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResendPolicy {
    /// Safe to repeat: the last write wins.
    Idempotent,
    /// Re-sent only when Slack never accepted the request.
    NotAccepted,
}

impl ResendPolicy {
    fn for_method(method: &str) -> Self {
        match method {
            "chat.update" => Self::Idempotent,
            _ => Self::NotAccepted,
        }
    }

    fn resends_status(self, status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS
            || (self == Self::Idempotent && status.is_server_error())
    }

    fn resends_transport_error(self, error: &reqwest::Error) -> bool {
        match self {
            Self::Idempotent => {
                error.is_connect() || error.is_timeout() || error.is_request() || error.is_body()
            }
            Self::NotAccepted => error.is_connect(),
        }
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let seconds = headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()?;
    Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER))
}

#[derive(Clone)]
pub struct SlackChatClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
    max_attempts: usize,
    base_delay: Duration,
}

impl SlackChatClient {
    pub fn new(config: &SlackChatConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("courier-slack-relay")
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .context("failed to create slack api client")?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.trim().to_string(),
            max_attempts: config.retry_max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms.max(1)),
        })
    }

    /// Delay before re-sending after `attempt` failed sends.
    fn backoff(&self, attempt: usize, retry_after: Option<Duration>) -> Duration {
        if let Some(retry_after) = retry_after {
            return retry_after;
        }
        let doublings = u32::try_from(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX)
            .min(MAX_BACKOFF_DOUBLINGS);
        self.base_delay.saturating_mul(1 << doublings)
    }

    /// Calls a `chat.*` method and checks Slack's `ok` flag.
    async fn call_chat_method(
        &self,
        method: &str,
        payload: &Value,
    ) -> Result<SlackChatMessageResponse> {
        let policy = ResendPolicy::for_method(method);
        let url = format!("{}/{method}", self.api_base);
        let mut attempt = 0_usize;
        let response = loop {
            attempt += 1;
            let delay = match self
                .http
                .post(&url)
                .bearer_auth(&self.bot_token)
                .header(ATTEMPT_HEADER, (attempt - 1).to_string())
                .json(payload)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => break response,
                Ok(response) => {
                    let status = response.status();
                    let wait = retry_after(response.headers());
                    if attempt >= self.max_attempts || !policy.resends_status(status) {
                        let body = response.text().await.unwrap_or_default();
                        bail!(
                            "slack api {method} failed with status {}: {}",
                            status.as_u16(),
                            truncate_for_error(&body, 800)
                        );
                    }
                    tracing::warn!(method, attempt, status = status.as_u16(), "re-sending slack request");
                    self.backoff(attempt, wait)
                }
                Err(error) => {
                    if attempt >= self.max_attempts || !policy.resends_transport_error(&error) {
                        return Err(error)
                            .with_context(|| format!("slack api {method} request failed"));
                    }
                    tracing::warn!(method, attempt, %error, "re-sending slack request");
                    self.backoff(attempt, None)
                }
            };
            tokio::time::sleep(delay).await;
        };

        let parsed = response
            .json::<SlackChatMessageResponse>()
            .await
            .with_context(|| format!("failed to decode slack {method} response"))?;
        if !parsed.ok {
            bail!(
                "slack {method} failed: {}",
                parsed.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(parsed)
    }
}

#[async_trait]
impl ChatClient for SlackChatClient {
    async fn post_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<ChatMessageHandle> {
        let mut payload = json!({
            "channel": channel,
            "text": text,
            "unfurl_links": false,
            "unfurl_media": false,
        });
        if let Some(thread_ts) = thread_ts.map(str::trim).filter(|value| !value.is_empty()) {
            payload["thread_ts"] = Value::String(thread_ts.to_string());
        }

        let response = self.call_chat_method("chat.postMessage", &payload).await?;
        Ok(ChatMessageHandle {
            channel: response.channel.unwrap_or_else(|| channel.to_string()),
            ts: response
                .ts
                .ok_or_else(|| anyhow!("slack chat.postMessage response missing ts"))?,
        })
    }

    async fn update_message(
        &self,
        handle: &ChatMessageHandle,
        text: &str,
    ) -> Result<ChatMessageHandle> {
        let payload = json!({
            "channel": handle.channel,
            "ts": handle.ts,
            "text": text,
        });
        let response = self.call_chat_method("chat.update", &payload).await?;
        Ok(ChatMessageHandle {
            channel: response.channel.unwrap_or_else(|| handle.channel.clone()),
            ts: response.ts.unwrap_or_else(|| handle.ts.clone()),
        })
    }
}
