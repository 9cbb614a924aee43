// src/fetch/canned.rs
// =============================================================================
// An in-memory Retriever backed by a fixed graph.
//
// Used by the `demo` subcommand and throughout the tests. Unknown ids fail
// with NotFound, just like a 404 from the HTTP retriever.
//
// Optional jitter makes every fetch sleep for a random 0..=jitter delay, which
// is enough to shuffle task completion order and to make replica races
// interesting.
// =============================================================================

use super::{Page, Retriever};
use crate::error::FetchError;
use crate::NodeId;
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct StaticRetriever {
    pages: HashMap<NodeId, Page>,
    jitter: Option<Duration>,
}

impl StaticRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a node and its outbound edges.
    pub fn with_page<I, T>(mut self, id: impl Into<NodeId>, content: &str, edges: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        self.pages.insert(id.into(), Page::new(content, edges));
        self
    }

    pub fn with_jitter(mut self, max_delay: Duration) -> Self {
        self.jitter = Some(max_delay);
        self
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// A small slice of golang.org with cycles and one dangling link
    /// (`/cmd/` is linked but not present).
    pub fn golang_sample() -> Self {
        Self::new()
            .with_page(
                "https://golang.org/",
                "The Go Programming Language",
                ["https://golang.org/pkg/", "https://golang.org/cmd/"],
            )
            .with_page(
                "https://golang.org/pkg/",
                "Packages",
                [
                    "https://golang.org/",
                    "https://golang.org/cmd/",
                    "https://golang.org/pkg/fmt/",
                    "https://golang.org/pkg/os/",
                ],
            )
            .with_page(
                "https://golang.org/pkg/fmt/",
                "Package fmt",
                ["https://golang.org/", "https://golang.org/pkg/"],
            )
            .with_page(
                "https://golang.org/pkg/os/",
                "Package os",
                ["https://golang.org/", "https://golang.org/pkg/"],
            )
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn fetch(&self, id: &NodeId) -> Result<Page, FetchError> {
        if let Some(max_delay) = self.jitter {
            let max_ms = max_delay.as_millis() as u64;
            let delay_ms = rand::rng().random_range(0..=max_ms);
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        self.pages
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::not_found(id))
    }
}
