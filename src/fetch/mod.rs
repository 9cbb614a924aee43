// src/fetch/mod.rs
// =============================================================================
// Retrieval: turning a node id into its content and outbound edges.
//
// The traversal engine only knows the `Retriever` trait. Implementations:
// - http: fetches real pages with reqwest and extracts links
// - canned: an in-memory graph, for demos and tests
// - replicated: races several retrievers and keeps the fastest answer
//
// Every implementation must be safe to call from many tasks at once; the
// engine calls `fetch` concurrently for every node it is expanding.
// =============================================================================

mod canned;
mod http;
mod links;
mod replicated;

use crate::error::FetchError;
use crate::NodeId;
use async_trait::async_trait;
use std::sync::Arc;

pub use canned::StaticRetriever;
pub use http::HttpRetriever;
pub use links::{extract_html_links, extract_markdown_links, page_title};
pub use replicated::ReplicatedRetriever;

/// What a retriever returns for one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Body of the node (page HTML, markdown, or plain text)
    pub content: String,
    /// Outbound edges in document order. Duplicates are allowed; the
    /// visit ledger filters them out.
    pub edges: Vec<NodeId>,
}

impl Page {
    pub fn new<I, T>(content: impl Into<String>, edges: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        Self {
            content: content.into(),
            edges: edges.into_iter().map(Into::into).collect(),
        }
    }
}

/// Maps a node id to its content and adjacent ids.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn fetch(&self, id: &NodeId) -> Result<Page, FetchError>;
}

#[async_trait]
impl<R: Retriever + ?Sized> Retriever for Arc<R> {
    async fn fetch(&self, id: &NodeId) -> Result<Page, FetchError> {
        (**self).fetch(id).await
    }
}
