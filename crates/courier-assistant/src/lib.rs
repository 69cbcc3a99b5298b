//! Generative-text subprocess streaming for courier.
//!
//! Spawns the assistant CLI in stream-json mode and exposes its output as a
//! `TextFragmentSource`, terminating the process on timeout or abandonment.

mod claude_stream;
mod stream_record;

pub use claude_stream::{AssistantStreamError, ClaudeStreamConfig, ClaudeStreamSource};
pub use stream_record::parse_stream_record;
