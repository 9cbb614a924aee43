// src/crawl/signal.rs
// =============================================================================
// Completion signals: how a child task tells its parent "I'm done".
//
// Each child gets a CompletionSignal (the sending half) and the parent keeps
// the matching Completion (the receiving half). The signal is consumed when
// it fires, so it can only ever be sent once.
//
// If a child task dies without firing (it panicked, or was dropped by the
// runtime), the oneshot sender is dropped and the Completion resolves anyway.
// A parent therefore never waits forever on a lost child.
//
// Rust concepts:
// - Consuming `self`: `finish(self)` moves the signal, so a second call does
//   not compile
// - Implementing Future by hand: Completion just forwards to the oneshot
//   receiver and throws away the "sender dropped" distinction
// =============================================================================

use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Creates a linked signal/completion pair for one child task.
pub fn completion_pair() -> (CompletionSignal, Completion) {
    let (tx, rx) = oneshot::channel();
    (CompletionSignal { tx }, Completion { rx })
}

/// Sending half, owned by the child task.
#[derive(Debug)]
pub struct CompletionSignal {
    tx: oneshot::Sender<()>,
}

impl CompletionSignal {
    pub fn finish(self) {
        // The parent may have stopped listening (deadline variant); that's fine
        let _ = self.tx.send(());
    }
}

/// Receiving half, owned by the parent. Resolves once the child is done.
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<()>,
}

impl Future for Completion {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        // Ok(()) = finished normally, Err(_) = child dropped its signal
        Pin::new(&mut self.get_mut().rx).poll(cx).map(|_| ())
    }
}

/// Waits until every completion has resolved, in whatever order they arrive.
///
/// There is no short-circuit: a failed child is just a finished child.
pub async fn wait_all(completions: Vec<Completion>) {
    let mut pending: FuturesUnordered<Completion> = completions.into_iter().collect();
    while pending.next().await.is_some() {}
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is a oneshot channel?
//    - A channel that carries exactly one value, from one sender to one receiver
//    - Sending consumes the sender, so it cannot be used twice
//    - The receiver is itself a future: .await it to get the value
//
// 2. What happens when the sender is dropped?
//    - The receiver resolves with Err(RecvError) instead of hanging
//    - Completion maps both outcomes to (), so a parent cannot tell a lost
//      child from a finished one, and does not need to
//
// 3. Why Pin::new(&mut ...) in poll?
//    - Future::poll takes Pin<&mut Self>
//    - oneshot::Receiver is Unpin, so pinning a plain &mut to it is allowed
//
// 4. What is FuturesUnordered?
//    - A set of futures polled together
//    - .next() yields whichever finishes first, not the order they were added
//    - The stream ends (returns None) once every future has resolved
// -----------------------------------------------------------------------------
