// src/crawl/testing.rs
// =============================================================================
// Test-only retriever wrapper that records how the engine calls it.
//
// CountingRetriever forwards to a StaticRetriever and keeps:
// - how many times each node was fetched
// - how many fetches were running at once, and the peak of that
// - how many fetches ran to the end
//
// It can also sleep before answering (globally or per node) and panic on
// one chosen node.
// =============================================================================

use crate::error::FetchError;
use crate::fetch::{Page, Retriever, StaticRetriever};
use crate::NodeId;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Stats {
    calls: DashMap<NodeId, usize>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    finished: AtomicUsize,
}

/// Wraps a StaticRetriever; counts calls per node and concurrent calls.
#[derive(Clone)]
pub(crate) struct CountingRetriever {
    inner: Arc<StaticRetriever>,
    stats: Arc<Stats>,
    delay: Duration,
    node_delays: Arc<DashMap<NodeId, Duration>>,
    panic_on: Option<NodeId>,
}

impl CountingRetriever {
    pub(crate) fn new(inner: StaticRetriever) -> Self {
        Self {
            inner: Arc::new(inner),
            stats: Arc::default(),
            delay: Duration::ZERO,
            node_delays: Arc::default(),
            panic_on: None,
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn with_node_delay(self, id: &str, delay: Duration) -> Self {
        self.node_delays.insert(NodeId::from(id), delay);
        self
    }

    pub(crate) fn panicking_on(mut self, id: &str) -> Self {
        self.panic_on = Some(NodeId::from(id));
        self
    }

    pub(crate) fn calls(&self, id: &str) -> usize {
        self.stats.calls.get(id).map(|count| *count).unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.stats.calls.iter().map(|entry| *entry.value()).sum()
    }

    pub(crate) fn max_calls_per_node(&self) -> usize {
        self.stats.calls.iter().map(|entry| *entry.value()).max().unwrap_or(0)
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.stats.in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.stats.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn finished(&self) -> usize {
        self.stats.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for CountingRetriever {
    async fn fetch(&self, id: &NodeId) -> Result<Page, FetchError> {
        *self.stats.calls.entry(id.clone()).or_insert(0) += 1;

        if self.panic_on.as_ref() == Some(id) {
            panic!("retriever exploded on {}", id);
        }

        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.node_delays.get(id).map(|d| *d).unwrap_or(self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let result = self.inner.fetch(id).await;

        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.stats.finished.fetch_add(1, Ordering::SeqCst);
        result
    }
}
