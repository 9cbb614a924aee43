// src/crawl/ledger.rs
// =============================================================================
// The visit ledger: which nodes have already been claimed in this run.
//
// The whole point of this type is `claim`. Checking "have we seen it?" and
// recording "we've seen it" happen under the same DashMap shard lock, via
// the entry API. Two tasks that discover the same URL at the same moment
// cannot both get `true` back; exactly one of them does, and the other backs
// off without fetching anything.
//
// Claims are permanent. There is no unclaim.
// =============================================================================

use crate::NodeId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

/// What the ledger remembers about a claimed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisitRecord {
    /// Link hops from the root along the path that won the claim
    pub depth: usize,
    /// Whether the retriever returned a page for it
    pub retrieved: bool,
}

#[derive(Debug, Default)]
pub struct VisitLedger {
    records: DashMap<NodeId, VisitRecord>,
}

impl VisitLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `id` if nobody has yet.
    ///
    /// Returns `true` if this caller now owns the node and should process
    /// it, `false` if it was already claimed.
    pub fn claim(&self, id: &NodeId, depth: usize) -> bool {
        match self.records.entry(id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(VisitRecord {
                    depth,
                    retrieved: false,
                });
                true
            }
        }
    }

    pub fn mark_retrieved(&self, id: &NodeId) {
        if let Some(mut record) = self.records.get_mut(id) {
            record.retrieved = true;
        }
    }

    pub fn is_claimed(&self, id: &NodeId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &NodeId) -> Option<VisitRecord> {
        self.records.get(id).map(|record| *record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of every claim, sorted by node id.
    pub fn records(&self) -> Vec<(NodeId, VisitRecord)> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
    }
}
