// src/node.rs
// =============================================================================
// The identifier of a node in the crawled graph.
//
// In the web domain a node is a page and its id is the page URL, but the
// traversal engine never looks inside: it only compares and hashes ids.
// Two ids are equal exactly when their strings are equal, so callers that
// want "https://a.com" and "https://a.com/" to be the same page must
// normalize before handing ids to the engine (the HTTP retriever does this
// by round-tripping every link through `url::Url`).
// =============================================================================

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque, comparable, hashable identifier for a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<url::Url> for NodeId {
    fn from(url: url::Url) -> Self {
        Self(url.into())
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets maps keyed by NodeId be queried with a plain &str
impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
