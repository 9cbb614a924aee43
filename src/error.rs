// src/error.rs
// =============================================================================
// Error types for the crawler library.
//
// Two families:
// - FetchError: one node could not be retrieved. This is never fatal to a
//   traversal; the branch that hit it simply ends there.
// - ConfigError: the crawler was set up with values it cannot run with.
//
// The binary wraps both in anyhow::Error when they need to bubble up to main.
// =============================================================================

use crate::NodeId;
use serde::Serialize;
use thiserror::Error;

/// A retriever could not produce a page for `id`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("failed to fetch {id}: {kind}")]
pub struct FetchError {
    /// The node that failed
    pub id: NodeId,
    /// Why it failed
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(id: NodeId, kind: FetchErrorKind) -> Self {
        Self { id, kind }
    }

    pub fn not_found(id: &NodeId) -> Self {
        Self::new(id.clone(), FetchErrorKind::NotFound)
    }

    /// Human-readable cause, without the node id
    pub fn cause(&self) -> String {
        self.kind.to_string()
    }
}

/// Categories of retrieval failure.
///
/// The transport-level variants mirror the ways a reqwest request can fail
/// (timeouts, redirect loops, DNS/connect, TLS).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// The id cannot be interpreted by this retriever (e.g. not a URL)
    #[error("invalid identifier: {0}")]
    InvalidId(String),
    /// 404 / 410, or an unknown node in an in-memory graph
    #[error("not found")]
    NotFound,
    /// Any other non-success HTTP status
    #[error("HTTP {0}")]
    Status(u16),
    #[error("request timed out")]
    Timeout,
    #[error("too many redirects")]
    TooManyRedirects,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("TLS error: {0}")]
    Tls(String),
    #[error("{0}")]
    Other(String),
}

/// Invalid crawler or retriever configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A fetch concurrency cap of zero would stall the crawl forever
    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    /// Building the underlying HTTP client failed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
