// src/fetch/replicated.rs
// =============================================================================
// A Retriever that asks several replicas for the same node and keeps the
// first successful answer.
//
// Slow replicas are not cancelled: they finish in the background and their
// answer is dropped (see crawl::race). An optional per-fetch timeout bounds
// how long we wait for *any* replica.
// =============================================================================

use super::{Page, Retriever};
use crate::crawl::race::first_ok;
use crate::error::{FetchError, FetchErrorKind};
use crate::NodeId;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Default)]
pub struct ReplicatedRetriever {
    replicas: Vec<Arc<dyn Retriever>>,
    timeout: Option<Duration>,
}

impl ReplicatedRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replica(mut self, replica: impl Retriever + 'static) -> Self {
        self.replicas.push(Arc::new(replica));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    async fn race(&self, id: &NodeId) -> Result<Page, FetchError> {
        let attempts = self.replicas.iter().map(|replica| {
            let replica = Arc::clone(replica);
            let id = id.clone();
            async move { replica.fetch(&id).await }
        });

        // All replicas failed: report the last failure, it's as good as any
        first_ok(attempts).await.map_err(|errors| {
            errors.into_iter().last().unwrap_or_else(|| {
                FetchError::new(
                    id.clone(),
                    FetchErrorKind::Other("no replica answered".to_string()),
                )
            })
        })
    }
}

#[async_trait]
impl Retriever for ReplicatedRetriever {
    async fn fetch(&self, id: &NodeId) -> Result<Page, FetchError> {
        match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, self.race(id)).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(%id, "all replicas timed out");
                    Err(FetchError::new(id.clone(), FetchErrorKind::Timeout))
                }
            },
            None => self.race(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticRetriever;

    struct Unreachable;

    #[async_trait]
    impl Retriever for Unreachable {
        async fn fetch(&self, id: &NodeId) -> Result<Page, FetchError> {
            Err(FetchError::new(
                id.clone(),
                FetchErrorKind::Connect("replica down".to_string()),
            ))
        }
    }

    struct Slow(Duration);

    #[async_trait]
    impl Retriever for Slow {
        async fn fetch(&self, _id: &NodeId) -> Result<Page, FetchError> {
            tokio::time::sleep(self.0).await;
            Ok(Page::new("late", Vec::<NodeId>::new()))
        }
    }

    #[tokio::test]
    async fn test_failed_replica_does_not_win() {
        let retriever = ReplicatedRetriever::new()
            .with_replica(Unreachable)
            .with_replica(StaticRetriever::golang_sample());

        let page = retriever.fetch(&NodeId::from("https://golang.org/")).await.unwrap();
        assert_eq!(page.content, "The Go Programming Language");
        assert_eq!(retriever.replica_count(), 2);
    }

    #[tokio::test]
    async fn test_all_replicas_fail() {
        let retriever = ReplicatedRetriever::new()
            .with_replica(Unreachable)
            .with_replica(Unreachable);

        let err = retriever.fetch(&NodeId::from("a")).await.unwrap_err();
        assert!(matches!(err.kind, FetchErrorKind::Connect(_)));
    }

    #[tokio::test]
    async fn test_no_replicas() {
        let err = ReplicatedRetriever::new()
            .fetch(&NodeId::from("a"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Other("no replica answered".to_string()));
    }

    #[tokio::test]
    async fn test_timeout_when_every_replica_is_slow() {
        let retriever = ReplicatedRetriever::new()
            .with_replica(Slow(Duration::from_secs(5)))
            .with_replica(Slow(Duration::from_secs(5)))
            .with_timeout(Duration::from_millis(50));

        let err = retriever.fetch(&NodeId::from("a")).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_fast_replica_beats_timeout() {
        let retriever = ReplicatedRetriever::new()
            .with_replica(Slow(Duration::from_secs(5)))
            .with_replica(Slow(Duration::from_millis(1)))
            .with_timeout(Duration::from_secs(1));

        let page = retriever.fetch(&NodeId::from("a")).await.unwrap();
        assert_eq!(page.content, "late");
    }
}
