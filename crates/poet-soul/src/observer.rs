//! Thought observer trait: how produced thoughts leave the thinker.

use futures::future::BoxFuture;

use crate::error::SoulError;

/// Receives every thought the thinker produces, together with the prompt
/// that produced it. Implemented by [`crate::ThoughtHistory`].
///
/// An error fails the whole cycle: the thinker keeps its current prompt and
/// retries after the short interval.
pub trait ThoughtObserver: Send + Sync + 'static {
    fn on_thought<'a>(
        &'a self,
        input: &'a str,
        thought: &'a str,
    ) -> BoxFuture<'a, Result<(), SoulError>>;
}
