// src/crawl/mod.rs
// =============================================================================
// The traversal engine.
//
// Features:
// - One concurrent task per discovered edge (fan-out)
// - Each page fetched at most once, even when found by several tasks at the
//   same moment (atomic claim in the visit ledger)
// - Hard depth limit
// - A task finishes only after all of its children finished (fan-in), so the
//   root finishing means the whole crawl is done
// - Optional cap on concurrent fetches
// - Failures end one branch, never the crawl
//
// Submodules:
// - ledger: the visited set
// - signal: per-child completion signals and wait_all
// - task:   the per-node state machine
// - driver: Crawler, the entry point
// - events: progress events and summary counters
// - race:   first-of-N and deadline combinators
// =============================================================================

mod driver;
mod events;
mod ledger;
pub mod race;
mod signal;
mod task;

#[cfg(test)]
pub(crate) mod testing;

pub use driver::{traverse, Crawler, Outcome, TraversalReport};
pub use events::{EventReceiver, EventSender, TraversalEvent, TraversalSummary};
pub use ledger::{VisitLedger, VisitRecord};
pub use race::{first_of, first_ok, gather_within, Gathered};
pub use signal::{completion_pair, wait_all, Completion, CompletionSignal};
