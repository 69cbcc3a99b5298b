use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Channel and optional thread a command reply belongs to.
pub struct ChatTarget {
    pub channel: String,
    pub thread_ts: Option<String>,
}

impl ChatTarget {
    pub fn new(channel: impl Into<String>, thread_ts: Option<String>) -> Self {
        Self {
            channel: channel.into(),
            thread_ts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Identifies one posted message that can be updated in place.
pub struct ChatMessageHandle {
    pub channel: String,
    pub ts: String,
}

#[async_trait]
/// Trait contract for the chat operations rendering needs.
pub trait ChatClient: Send + Sync {
    async fn post_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<ChatMessageHandle>;

    async fn update_message(&self, handle: &ChatMessageHandle, text: &str)
        -> Result<ChatMessageHandle>;
}
