// src/crawl/race.rs
// =============================================================================
// Race and deadline combinators over spawned tasks.
//
// These are the "ask several, keep the first / keep what arrives in time"
// cousins of the traversal fan-in:
// - first_of:      N redundant futures, return whichever finishes first
// - first_ok:      like first_of, but skip failures
// - gather_within: collect every result that arrives before a deadline
//
// first_ok is what ReplicatedRetriever races its replicas with. first_of and
// gather_within are exported for library users (re-exported from
// fanout_crawler::crawl); the crawler and the binary don't call them.
//
// Abandoned branches
// ------------------
// Each input future is spawned onto the tokio runtime. When a combinator
// returns early, the remaining tasks are *detached*, not cancelled: they run
// to completion in the background and their results are dropped. That is
// not an error; those branches are simply no longer waited upon.
// =============================================================================

use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// What `gather_within` managed to collect before its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gathered<T> {
    /// Results in completion order
    pub completed: Vec<T>,
    /// Tasks still running when the deadline hit (left detached)
    pub abandoned: usize,
}

fn spawn_all<I, F, T>(futures: I) -> FuturesUnordered<JoinHandle<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    futures.into_iter().map(tokio::spawn).collect()
}

/// Runs every replica concurrently and returns the first result.
///
/// Returns `None` only if there were no replicas, or every one panicked.
pub async fn first_of<I, F, T>(replicas: I) -> Option<T>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let mut pending = spawn_all(replicas);

    while let Some(joined) = pending.next().await {
        match joined {
            Ok(value) => {
                debug!(abandoned = pending.len(), "race won");
                return Some(value);
            }
            Err(e) => warn!("replica task failed: {}", e),
        }
    }

    None
}

/// Runs every replica concurrently and returns the first `Ok`.
///
/// If none succeeds, every error is returned in completion order (empty if
/// there were no replicas).
pub async fn first_ok<I, F, T, E>(replicas: I) -> Result<T, Vec<E>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let mut pending = spawn_all(replicas);
    let mut errors = Vec::new();

    while let Some(joined) = pending.next().await {
        match joined {
            Ok(Ok(value)) => {
                debug!(abandoned = pending.len(), failed = errors.len(), "race won");
                return Ok(value);
            }
            Ok(Err(e)) => errors.push(e),
            Err(e) => warn!("replica task failed: {}", e),
        }
    }

    Err(errors)
}

/// Collects results until every future is done or `timeout` elapses,
/// whichever comes first.
pub async fn gather_within<I, F, T>(futures: I, timeout: Duration) -> Gathered<T>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let mut pending = spawn_all(futures);
    let mut completed = Vec::with_capacity(pending.len());

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        let next = tokio::select! {
            next = pending.next() => next,
            _ = &mut deadline => {
                debug!("timed out");
                break;
            }
        };

        match next {
            Some(Ok(value)) => completed.push(value),
            Some(Err(e)) => warn!("task failed: {}", e),
            None => break,
        }
    }

    Gathered {
        completed,
        abandoned: pending.len(),
    }
}
