// src/lib.rs
// =============================================================================
// fanout-crawler: a concurrent, depth-bounded, deduplicating crawler.
//
// Modules:
// - crawl:  the traversal engine (ledger, tasks, fan-in, driver, races)
// - fetch:  the Retriever trait plus HTTP, in-memory and replicated retrievers
// - config: TraversalConfig and HttpConfig
// - error:  FetchError and ConfigError
//
// Quick example (in-memory graph):
//
//   let graph = StaticRetriever::golang_sample();
//   let summary = traverse("https://golang.org/", 4, graph).await;
//   assert_eq!(summary.retrieved, 4);
// =============================================================================

pub mod config;
pub mod crawl;
pub mod error;
pub mod fetch;
mod node;

pub use config::{HttpConfig, TraversalConfig};
pub use crawl::{traverse, Crawler, Outcome, TraversalEvent, TraversalReport, TraversalSummary};
pub use error::{ConfigError, FetchError, FetchErrorKind};
pub use fetch::{HttpRetriever, Page, ReplicatedRetriever, Retriever, StaticRetriever};
pub use node::NodeId;
