// src/crawl/events.rs
// =============================================================================
// Everything a traversal reports while it runs.
//
// The engine itself keeps nothing but the ledger. Pages, failures and skips
// are pushed into an optional unbounded channel as they happen, and
// whoever embeds the engine decides what to keep (the CLI prints and
// collects them into a report). Every task emits its event *before* it
// signals completion, so once a traversal has completed the channel already
// holds every event for it.
//
// Counters are kept alongside for a cheap summary at the end.
// =============================================================================

use crate::error::FetchError;
use crate::NodeId;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraversalEvent {
    /// The retriever returned a page; children are being spawned
    Retrieved {
        id: NodeId,
        depth: usize,
        content: String,
        edges: Vec<NodeId>,
    },
    /// The retriever failed; this branch ends here
    Failed { depth: usize, error: FetchError },
    /// Someone else already claimed the node
    Rejected { id: NodeId, depth: usize },
    /// Claimed at the depth limit, so not fetched
    DepthExhausted { id: NodeId, depth: usize },
}

impl TraversalEvent {
    pub fn id(&self) -> &NodeId {
        match self {
            TraversalEvent::Retrieved { id, .. }
            | TraversalEvent::Rejected { id, .. }
            | TraversalEvent::DepthExhausted { id, .. } => id,
            TraversalEvent::Failed { error, .. } => &error.id,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<TraversalEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<TraversalEvent>;

/// Totals for one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraversalSummary {
    /// Distinct nodes claimed (= size of the ledger)
    pub claimed: usize,
    pub retrieved: usize,
    pub failed: usize,
    pub rejected: usize,
    pub depth_exhausted: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) claimed: AtomicUsize,
    pub(crate) retrieved: AtomicUsize,
    pub(crate) failed: AtomicUsize,
    pub(crate) rejected: AtomicUsize,
    pub(crate) depth_exhausted: AtomicUsize,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> TraversalSummary {
        TraversalSummary {
            claimed: self.claimed.load(Ordering::Relaxed),
            retrieved: self.retrieved.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            depth_exhausted: self.depth_exhausted.load(Ordering::Relaxed),
        }
    }
}
