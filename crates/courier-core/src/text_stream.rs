//! Pull-based text fragment sources.

use std::collections::VecDeque;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

#[async_trait]
/// A sequence of text fragments arriving over time, possibly ending in error.
///
/// `Ok(Some(_))` yields the next fragment, `Ok(None)` marks end of stream and
/// `Err(_)` marks a terminal failure. Callers stop polling after either.
pub trait TextFragmentSource: Send {
    async fn next_fragment(&mut self) -> Result<Option<String>>;
}

/// In-memory source that replays a fixed list of fragments.
#[derive(Debug, Default)]
pub struct StaticTextSource {
    fragments: VecDeque<String>,
    failure: Option<String>,
}

impl StaticTextSource {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            failure: None,
        }
    }

    pub fn single(text: impl Into<String>) -> Self {
        Self::new([text.into()])
    }

    /// Replays `fragments`, then fails with `message` instead of ending cleanly.
    pub fn failing_after<I, S>(fragments: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failure: Some(message.into()),
            ..Self::new(fragments)
        }
    }
}

#[async_trait]
impl TextFragmentSource for StaticTextSource {
    async fn next_fragment(&mut self) -> Result<Option<String>> {
        if let Some(fragment) = self.fragments.pop_front() {
            return Ok(Some(fragment));
        }
        match self.failure.take() {
            Some(message) => Err(anyhow!(message)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{StaticTextSource, TextFragmentSource};

    #[tokio::test]
    async fn unit_static_text_source_replays_fragments_then_ends() {
        let mut source = StaticTextSource::new(["a", "b"]);
        assert_eq!(source.next_fragment().await.expect("a"), Some("a".to_string()));
        assert_eq!(source.next_fragment().await.expect("b"), Some("b".to_string()));
        assert_eq!(source.next_fragment().await.expect("end"), None);
        assert_eq!(source.next_fragment().await.expect("still end"), None);
    }

    #[tokio::test]
    async fn functional_static_text_source_fails_once_after_fragments() {
        let mut source = StaticTextSource::failing_after(["partial"], "stream broke");
        assert_eq!(
            source.next_fragment().await.expect("partial"),
            Some("partial".to_string())
        );
        let error = source.next_fragment().await.expect_err("failure");
        assert_eq!(error.to_string(), "stream broke");
        assert_eq!(source.next_fragment().await.expect("drained"), None);
    }
}
