//! Foundational text-stream and text-shaping utilities shared across courier crates.
//!
//! Provides the pull-based fragment source consumed by chat rendering and the
//! character-boundary-safe truncation helpers used for error and prompt text.

pub mod text_stream;
pub mod text_utils;

pub use text_stream::{StaticTextSource, TextFragmentSource};
pub use text_utils::{char_count, tail_chars, truncate_for_error};
