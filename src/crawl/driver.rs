// src/crawl/driver.rs
// =============================================================================
// The root driver: starts the root task and waits for the whole tree.
//
// A Crawler is built once from a retriever and a TraversalConfig and can
// run any number of traversals. Each run gets a fresh ledger, which is
// dropped when the run returns; what the caller gets back is a snapshot.
//
// Two ways to run:
// - run():        wait until every task has finished
// - run_within(): stop waiting at a deadline. Tasks still in flight keep
//                 running in the background (they are detached, not
//                 cancelled) and whatever they discover is not reported
//                 in the outcome.
// =============================================================================

use super::events::{EventSender, TraversalSummary};
use super::ledger::VisitRecord;
use super::signal::Completion;
use super::task::{spawn_task, Traversal};
use crate::config::TraversalConfig;
use crate::error::ConfigError;
use crate::fetch::Retriever;
use crate::NodeId;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Result of a traversal that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraversalReport {
    pub root: NodeId,
    pub summary: TraversalSummary,
    /// Every claimed node, sorted by id
    pub visited: Vec<(NodeId, VisitRecord)>,
}

impl TraversalReport {
    pub fn record(&self, id: &str) -> Option<VisitRecord> {
        self.visited
            .binary_search_by(|(candidate, _)| candidate.as_str().cmp(id))
            .ok()
            .map(|index| self.visited[index].1)
    }
}

/// Result of a deadline-bounded traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Completed(TraversalReport),
    /// The deadline hit first. `summary` is what had happened by then.
    Abandoned {
        root: NodeId,
        summary: TraversalSummary,
    },
}

impl Outcome {
    pub fn summary(&self) -> TraversalSummary {
        match self {
            Outcome::Completed(report) => report.summary,
            Outcome::Abandoned { summary, .. } => *summary,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }
}

pub struct Crawler {
    retriever: Arc<dyn Retriever>,
    config: TraversalConfig,
    events: Option<EventSender>,
}

impl Crawler {
    pub fn new(retriever: impl Retriever + 'static, config: TraversalConfig) -> Result<Self, ConfigError> {
        Self::from_shared(Arc::new(retriever), config)
    }

    pub fn from_shared(retriever: Arc<dyn Retriever>, config: TraversalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            retriever,
            config,
            events: None,
        })
    }

    /// Streams every task's outcome into `events` while running.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    fn start(&self, root: &NodeId) -> (Arc<Traversal>, Completion) {
        let traversal = Arc::new(Traversal::new(
            Arc::clone(&self.retriever),
            self.config.max_concurrent_fetches,
            self.events.clone(),
        ));

        info!(
            root = %root,
            max_depth = self.config.max_depth,
            concurrency = ?self.config.max_concurrent_fetches,
            "starting traversal"
        );

        let completion = spawn_task(Arc::clone(&traversal), root.clone(), 0, self.config.max_depth);
        (traversal, completion)
    }

    /// Crawls from `root` and returns once every task has finished.
    pub async fn run(&self, root: impl Into<NodeId>) -> TraversalReport {
        let root = root.into();
        let started = Instant::now();
        let (traversal, completion) = self.start(&root);

        completion.await;

        let summary = traversal.counters.snapshot();
        info!(
            claimed = summary.claimed,
            retrieved = summary.retrieved,
            failed = summary.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "traversal complete"
        );

        TraversalReport {
            root,
            summary,
            visited: traversal.ledger.records(),
        }
    }

    /// Like [`Crawler::run`], but gives up waiting after `deadline`.
    pub async fn run_within(&self, root: impl Into<NodeId>, deadline: Duration) -> Outcome {
        let root = root.into();
        let (traversal, completion) = self.start(&root);

        match tokio::time::timeout(deadline, completion).await {
            Ok(()) => Outcome::Completed(TraversalReport {
                root,
                summary: traversal.counters.snapshot(),
                visited: traversal.ledger.records(),
            }),
            Err(_) => {
                let summary = traversal.counters.snapshot();
                warn!(
                    claimed = summary.claimed,
                    "deadline of {:?} reached, abandoning in-flight tasks", deadline
                );
                Outcome::Abandoned { root, summary }
            }
        }
    }
}

/// Visits everything reachable from `root` within `max_depth` hops, each
/// node at most once, and returns when the whole tree has finished.
pub async fn traverse(
    root: impl Into<NodeId>,
    max_depth: usize,
    retriever: impl Retriever + 'static,
) -> TraversalSummary {
    Crawler {
        retriever: Arc::new(retriever),
        config: TraversalConfig::new(max_depth),
        events: None,
    }
    .run(root)
    .await
    .summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::events::TraversalEvent;
    use crate::crawl::testing::CountingRetriever;
    use crate::fetch::StaticRetriever;
    use tokio::sync::mpsc;

    const NO_EDGES: [&str; 0] = [];

    fn crawler(retriever: &CountingRetriever, max_depth: usize) -> Crawler {
        Crawler::new(retriever.clone(), TraversalConfig::new(max_depth)).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cycle_each_node_fetched_once() {
        let retriever = CountingRetriever::new(
            StaticRetriever::new()
                .with_page("A", "a", ["B", "C"])
                .with_page("B", "b", ["A", "C"])
                .with_page("C", "c", NO_EDGES),
        );

        let report = crawler(&retriever, 3).run("A").await;

        for id in ["A", "B", "C"] {
            assert_eq!(retriever.calls(id), 1, "{} fetched once", id);
        }
        assert_eq!(report.summary.claimed, 3);
        assert_eq!(report.summary.retrieved, 3);
        // A via B, and one of the two C tasks
        assert_eq!(report.summary.rejected, 2);
        assert_eq!(report.visited.len(), 3);
    }

    #[tokio::test]
    async fn test_depth_zero_claims_root_only() {
        let retriever = CountingRetriever::new(StaticRetriever::new().with_page("A", "a", ["B"]));

        let report = crawler(&retriever, 0).run("A").await;

        assert_eq!(retriever.total_calls(), 0);
        assert_eq!(
            report.record("A"),
            Some(VisitRecord {
                depth: 0,
                retrieved: false
            })
        );
        assert_eq!(report.record("B"), None);
        assert_eq!(report.summary.depth_exhausted, 1);
    }

    #[tokio::test]
    async fn test_duplicate_edges_fetch_once() {
        let retriever = CountingRetriever::new(
            StaticRetriever::new()
                .with_page("A", "a", ["B", "B"])
                .with_page("B", "b", NO_EDGES),
        );

        let report = crawler(&retriever, 2).run("A").await;

        assert_eq!(retriever.calls("B"), 1);
        assert_eq!(report.summary.rejected, 1);
        assert_eq!(report.summary.retrieved, 2);
    }

    #[tokio::test]
    async fn test_depth_bound_on_a_chain() {
        let retriever = CountingRetriever::new(
            StaticRetriever::new()
                .with_page("A", "a", ["B"])
                .with_page("B", "b", ["C"])
                .with_page("C", "c", ["D"])
                .with_page("D", "d", NO_EDGES),
        );

        let report = crawler(&retriever, 2).run("A").await;

        assert_eq!(retriever.calls("A"), 1);
        assert_eq!(retriever.calls("B"), 1);
        assert_eq!(retriever.calls("C"), 0);
        assert_eq!(report.record("C").map(|r| (r.depth, r.retrieved)), Some((2, false)));
        assert_eq!(report.record("D"), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failure_does_not_stop_siblings() {
        let retriever = CountingRetriever::new(
            StaticRetriever::new()
                .with_page("A", "a", ["missing", "B"])
                .with_page("B", "b", ["C"])
                .with_page("C", "c", NO_EDGES),
        );

        let report = crawler(&retriever, 3).run("A").await;

        assert_eq!(retriever.calls("missing"), 1);
        assert_eq!(retriever.calls("C"), 1);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.retrieved, 3);
        assert_eq!(report.record("missing").map(|r| r.retrieved), Some(false));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_golang_sample() {
        let retriever = CountingRetriever::new(StaticRetriever::golang_sample())
            .with_delay(Duration::from_millis(5));

        let summary = traverse("https://golang.org/", 4, retriever.clone()).await;

        assert_eq!(summary.retrieved, 4);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.claimed, 5);
        assert!(retriever.max_calls_per_node() <= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_returns_only_after_every_task_finished() {
        let retriever = CountingRetriever::new(StaticRetriever::golang_sample())
            .with_delay(Duration::from_millis(20));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let report = crawler(&retriever, 4).with_events(tx).run("https://golang.org/").await;

        assert_eq!(retriever.in_flight(), 0);
        assert_eq!(retriever.finished(), retriever.total_calls());

        // Each task reports exactly once, before signalling its parent
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), report.summary.claimed + report.summary.rejected);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, TraversalEvent::Retrieved { .. }))
                .count(),
            report.summary.retrieved
        );
    }

    #[tokio::test]
    async fn test_concurrency_cap_bounds_in_flight_fetches() {
        let leaves: Vec<String> = (0..20).map(|i| format!("leaf-{}", i)).collect();
        let mut graph = StaticRetriever::new().with_page("root", "root", leaves.clone());
        for leaf in &leaves {
            graph = graph.with_page(leaf.as_str(), "leaf", NO_EDGES);
        }
        let retriever = CountingRetriever::new(graph).with_delay(Duration::from_millis(10));

        let crawler = Crawler::new(
            retriever.clone(),
            TraversalConfig::new(2).with_concurrency_limit(3),
        )
        .unwrap();
        let report = crawler.run("root").await;

        assert_eq!(report.summary.retrieved, 21);
        assert!(retriever.max_in_flight() <= 3);
    }

    #[tokio::test]
    async fn test_unbounded_fetches_overlap() {
        let leaves: Vec<String> = (0..10).map(|i| format!("leaf-{}", i)).collect();
        let mut graph = StaticRetriever::new().with_page("root", "root", leaves.clone());
        for leaf in &leaves {
            graph = graph.with_page(leaf.as_str(), "leaf", NO_EDGES);
        }
        let retriever = CountingRetriever::new(graph).with_delay(Duration::from_millis(20));

        crawler(&retriever, 2).run("root").await;

        assert!(retriever.max_in_flight() > 1);
    }

    #[tokio::test]
    async fn test_panicking_retriever_does_not_hang_parent() {
        let retriever = CountingRetriever::new(
            StaticRetriever::new()
                .with_page("A", "a", ["boom", "B"])
                .with_page("B", "b", NO_EDGES),
        )
        .panicking_on("boom");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let crawler = crawler(&retriever, 2).with_events(tx);
        let report = tokio::time::timeout(Duration::from_secs(5), crawler.run("A"))
            .await
            .expect("traversal finished");

        assert_eq!(report.summary.claimed, 3);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.retrieved, 2);
        assert_eq!(retriever.calls("B"), 1);

        let mut boom_failures = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let TraversalEvent::Failed { error, .. } = event {
                boom_failures.push(error);
            }
        }
        assert_eq!(boom_failures.len(), 1);
        assert_eq!(boom_failures[0].id, NodeId::from("boom"));
        assert_eq!(
            boom_failures[0].kind,
            crate::error::FetchErrorKind::Other("retriever panicked".to_string())
        );
    }

    #[tokio::test]
    async fn test_deadline_abandons_slow_branches() {
        let retriever = CountingRetriever::new(
            StaticRetriever::new()
                .with_page("A", "a", ["slow"])
                .with_page("slow", "slow", NO_EDGES),
        )
        .with_node_delay("slow", Duration::from_secs(5));

        let outcome = crawler(&retriever, 2)
            .run_within("A", Duration::from_millis(100))
            .await;

        assert!(!outcome.is_completed());
        assert_eq!(outcome.summary().retrieved, 1);
        assert_eq!(outcome.summary().claimed, 2);
    }

    #[tokio::test]
    async fn test_deadline_not_reached() {
        let retriever = CountingRetriever::new(StaticRetriever::golang_sample());

        let outcome = crawler(&retriever, 4)
            .run_within("https://golang.org/", Duration::from_secs(5))
            .await;

        match outcome {
            Outcome::Completed(report) => assert_eq!(report.summary.retrieved, 4),
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let result = Crawler::new(
            StaticRetriever::new(),
            TraversalConfig::new(1).with_concurrency_limit(0),
        );
        assert!(matches!(result, Err(ConfigError::ZeroConcurrency)));
    }
}
