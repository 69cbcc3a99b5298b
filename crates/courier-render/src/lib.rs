//! Incremental chat rendering for courier.
//!
//! Hosts the chat-client seam and its Slack Web API implementation, the
//! message segment splitter, and the throttled render session that streams
//! text fragments into a primary message plus thread continuations.

mod chat_client;
mod render_session;
mod segment_split;
mod slack_api_client;

pub use chat_client::{ChatClient, ChatMessageHandle, ChatTarget};
pub use render_session::{
    render_text_stream, RenderConfig, RenderSession, RenderState, DEFAULT_PLACEHOLDER,
    DEFAULT_THROTTLE,
};
pub use segment_split::{split_into_segments, DEFAULT_MAX_MESSAGE_CHARS};
pub use slack_api_client::{SlackChatClient, SlackChatConfig};
