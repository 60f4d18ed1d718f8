use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::{Stream, StreamExt};

use crate::stages::{Signal, Upstream};

#[derive(Debug, Default)]
struct ProbeState {
    pulls: AtomicUsize,
    terminated: AtomicBool,
    cancelled: AtomicBool,
}

/// Records how a downstream consumer drives a sequence: how many elements it
/// asked for, and whether it let go before the sequence terminated.
///
/// Clones share the same counters, so a test keeps one handle while the
/// pipeline owns the other.
#[derive(Debug, Clone, Default)]
pub struct DemandProbe {
    state: Arc<ProbeState>,
}

impl DemandProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests made for a next signal.
    pub fn pulls(&self) -> usize {
        self.state.pulls.load(Ordering::SeqCst)
    }

    /// The sequence delivered its terminal signal (completion or failure).
    pub fn terminated(&self) -> bool {
        self.state.terminated.load(Ordering::SeqCst)
    }

    /// The sequence was dropped before delivering a terminal signal.
    pub fn cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    fn record_pull(&self) {
        self.state.pulls.fetch_add(1, Ordering::SeqCst);
    }

    fn mark_terminated(&self) {
        self.state.terminated.store(true, Ordering::SeqCst);
    }

    fn mark_cancelled(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
    }
}

pub(crate) struct Probed<T> {
    upstream: Upstream<T>,
    probe: DemandProbe,
    awaiting: bool,
    finished: bool,
}

impl<T> Probed<T> {
    pub(crate) fn new(upstream: Upstream<T>, probe: DemandProbe) -> Self {
        Self {
            upstream,
            probe,
            awaiting: false,
            finished: false,
        }
    }
}

impl<T> Stream for Probed<T> {
    type Item = Signal<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        // A re-poll after Pending continues the same request.
        if !this.awaiting {
            this.probe.record_pull();
            this.awaiting = true;
        }

        let signal = match this.upstream.poll_next_unpin(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(signal) => signal,
        };
        this.awaiting = false;
        if !matches!(signal, Some(Ok(_))) {
            this.finished = true;
            this.probe.mark_terminated();
        }
        Poll::Ready(signal)
    }
}

impl<T> Drop for Probed<T> {
    fn drop(&mut self) {
        if !self.finished {
            self.probe.mark_cancelled();
        }
    }
}
