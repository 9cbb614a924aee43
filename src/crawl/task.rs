// src/crawl/task.rs
// =============================================================================
// The traversal task: one per (node, path) the crawl discovers.
//
// Life of a task:
//
//   claim the node in the ledger
//     ├─ already claimed        -> Rejected        (done, no children)
//     ├─ no depth left          -> DepthExhausted  (done, no children)
//     └─ fetch it
//          ├─ error             -> Failed          (done, no children)
//          └─ page              -> spawn one child per edge,
//                                  wait for every child,
//                                  Expanded        (done)
//
// Only after that does the task fire its own completion signal, so a
// parent's completion always means "my whole subtree is finished".
//
// Tasks are spawned with tokio::spawn and run on any worker thread. The
// recursion (a task spawning tasks) goes through a boxed future, because an
// async fn cannot contain its own future type.
// =============================================================================

use super::events::{Counters, EventSender, TraversalEvent};
use super::ledger::VisitLedger;
use super::signal::{completion_pair, wait_all, Completion, CompletionSignal};
use crate::error::{FetchError, FetchErrorKind};
use crate::fetch::{Page, Retriever};
use crate::NodeId;
use futures::future::{BoxFuture, FutureExt};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// How a task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Terminal {
    Rejected,
    DepthExhausted,
    Failed,
    Expanded { children: usize },
}

/// State shared by every task of one traversal run.
pub(crate) struct Traversal {
    pub(crate) retriever: Arc<dyn Retriever>,
    pub(crate) ledger: VisitLedger,
    pub(crate) fetch_permits: Option<Semaphore>,
    pub(crate) events: Option<EventSender>,
    pub(crate) counters: Counters,
}

impl Traversal {
    pub(crate) fn new(
        retriever: Arc<dyn Retriever>,
        max_concurrent_fetches: Option<usize>,
        events: Option<EventSender>,
    ) -> Self {
        Self {
            retriever,
            ledger: VisitLedger::new(),
            fetch_permits: max_concurrent_fetches.map(Semaphore::new),
            events,
            counters: Counters::default(),
        }
    }

    fn emit(&self, event: TraversalEvent) {
        if let Some(events) = &self.events {
            // Receiver gone means nobody is listening anymore; keep crawling
            let _ = events.send(event);
        }
    }

    async fn retrieve(&self, id: &NodeId) -> Result<Page, FetchError> {
        // The permit is held only for the duration of the fetch. Tasks
        // waiting on children hold none, so a capped crawl cannot deadlock.
        let _permit = match &self.fetch_permits {
            Some(permits) => Some(permits.acquire().await.map_err(|_| {
                FetchError::new(
                    id.clone(),
                    FetchErrorKind::Other("fetch limiter closed".to_string()),
                )
            })?),
            None => None,
        };

        // A panicking retriever must still end its branch as a reported
        // failure, not as a silently dropped task
        match AssertUnwindSafe(self.retriever.fetch(id)).catch_unwind().await {
            Ok(result) => result,
            Err(_) => Err(FetchError::new(
                id.clone(),
                FetchErrorKind::Other("retriever panicked".to_string()),
            )),
        }
    }

    async fn run(self: Arc<Self>, id: NodeId, depth: usize, remaining: usize) -> Terminal {
        if !self.ledger.claim(&id, depth) {
            Counters::bump(&self.counters.rejected);
            debug!(%id, depth, "already claimed");
            self.emit(TraversalEvent::Rejected { id, depth });
            return Terminal::Rejected;
        }
        Counters::bump(&self.counters.claimed);

        if remaining == 0 {
            Counters::bump(&self.counters.depth_exhausted);
            debug!(%id, depth, "depth limit reached");
            self.emit(TraversalEvent::DepthExhausted { id, depth });
            return Terminal::DepthExhausted;
        }

        let page = match self.retrieve(&id).await {
            Ok(page) => page,
            Err(error) => {
                Counters::bump(&self.counters.failed);
                warn!(depth, "{}", error);
                self.emit(TraversalEvent::Failed { depth, error });
                return Terminal::Failed;
            }
        };
        self.ledger.mark_retrieved(&id);
        Counters::bump(&self.counters.retrieved);

        // Report the page before its children can report theirs
        let edges = page.edges.clone();
        self.emit(TraversalEvent::Retrieved {
            id,
            depth,
            content: page.content,
            edges: page.edges,
        });

        let children: Vec<Completion> = edges
            .into_iter()
            .map(|edge| spawn_task(Arc::clone(&self), edge, depth + 1, remaining - 1))
            .collect();
        let spawned = children.len();

        wait_all(children).await;
        Terminal::Expanded { children: spawned }
    }
}

/// Spawns a task for `id` and hands back its completion.
pub(crate) fn spawn_task(
    traversal: Arc<Traversal>,
    id: NodeId,
    depth: usize,
    remaining: usize,
) -> Completion {
    let (signal, completion) = completion_pair();
    tokio::spawn(task(traversal, id, depth, remaining, signal));
    completion
}

fn task(
    traversal: Arc<Traversal>,
    id: NodeId,
    depth: usize,
    remaining: usize,
    signal: CompletionSignal,
) -> BoxFuture<'static, ()> {
    async move {
        let terminal = traversal.run(id, depth, remaining).await;
        if let Terminal::Expanded { children } = terminal {
            debug!(depth, children, "subtree finished");
        }
        signal.finish();
    }
    .boxed()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why `self: Arc<Self>` on run?
//    - Every child task needs its own handle to the shared Traversal
//    - Arc::clone only bumps a reference count; the ledger and counters are
//      never copied
//    - tokio::spawn needs 'static data, which a borrowed &self cannot give
//
// 2. Why does task() return BoxFuture instead of being an async fn?
//    - run spawns task, and task awaits run: the future type would contain
//      itself and have infinite size
//    - .boxed() puts the future on the heap, which breaks the cycle
//
// 3. What is catch_unwind doing on a future?
//    - It turns a panic inside the retriever's future into an Err value
//    - AssertUnwindSafe tells the compiler we accept whatever state the
//      retriever is left in after the panic
//
// 4. Why is the permit stored in `_permit` and not `_`?
//    - `let _ = ...` drops the value immediately
//    - `let _permit = ...` keeps it alive until the end of the function, so
//      the semaphore slot is released only after the fetch finishes
// -----------------------------------------------------------------------------
