//! Stream adapters behind the `Flux` stage methods.
//!
//! Every stage owns its upstream through a [`Link`]. Dropping the upstream is how
//! a stage cancels demand: once a stage has seen a terminal signal, or no longer
//! needs elements, the upstream is released and never polled again.

use std::any::Any;
use std::collections::HashSet;
use std::hash::Hash;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{BoxStream, Stream, StreamExt};
use futures::ready;
use log::{debug, trace};

use crate::error::SequenceError;

/// One signal of a sequence: an element or the terminal failure.
pub type Signal<T> = Result<T, SequenceError>;

/// Element of a sequence whose values have mixed runtime types.
pub type Mashed = Box<dyn Any + Send>;

pub(crate) type Upstream<T> = BoxStream<'static, Signal<T>>;

pub(crate) type Predicate<T> = Box<dyn FnMut(&T) -> Result<bool, SequenceError> + Send>;

// =============================================================================
// Link: owned upstream with release-on-terminal
// =============================================================================

struct Link<T> {
    upstream: Option<Upstream<T>>,
    stage: &'static str,
}

impl<T> Link<T> {
    fn new(upstream: Upstream<T>, stage: &'static str) -> Self {
        Self {
            upstream: Some(upstream),
            stage,
        }
    }

    /// Pulls the next signal. Completion and failure both release the upstream,
    /// so a terminated link answers `None` forever after.
    fn poll_signal(&mut self, cx: &mut Context<'_>) -> Poll<Option<Signal<T>>> {
        let Some(upstream) = self.upstream.as_mut() else {
            return Poll::Ready(None);
        };

        let signal = ready!(upstream.poll_next_unpin(cx));
        match &signal {
            Some(Ok(_)) => {}
            Some(Err(err)) => {
                debug!("{}: upstream failed ({}), terminating", self.stage, err);
                self.upstream = None;
            }
            None => {
                trace!("{}: upstream completed", self.stage);
                self.upstream = None;
            }
        }
        Poll::Ready(signal)
    }

    fn cancel(&mut self) {
        if self.upstream.take().is_some() {
            debug!("{}: cancelling upstream demand", self.stage);
        }
    }
}

// =============================================================================
// Filter
// =============================================================================

pub(crate) struct Filter<T> {
    link: Link<T>,
    predicate: Predicate<T>,
}

impl<T> Filter<T> {
    pub(crate) fn new(upstream: Upstream<T>, predicate: Predicate<T>) -> Self {
        Self {
            link: Link::new(upstream, "filter"),
            predicate,
        }
    }
}

impl<T> Stream for Filter<T> {
    type Item = Signal<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match ready!(this.link.poll_signal(cx)) {
                Some(Ok(item)) => match (this.predicate)(&item) {
                    Ok(true) => return Poll::Ready(Some(Ok(item))),
                    Ok(false) => continue,
                    Err(err) => {
                        this.link.cancel();
                        return Poll::Ready(Some(Err(err)));
                    }
                },
                other => return Poll::Ready(other),
            }
        }
    }
}

// =============================================================================
// OfType: runtime type narrowing
// =============================================================================

pub(crate) struct OfType<U> {
    link: Link<Mashed>,
    dropped: usize,
    _target: PhantomData<fn() -> U>,
}

impl<U> OfType<U> {
    pub(crate) fn new(upstream: Upstream<Mashed>) -> Self {
        Self {
            link: Link::new(upstream, "of_type"),
            dropped: 0,
            _target: PhantomData,
        }
    }
}

impl<U: Any> Stream for OfType<U> {
    type Item = Signal<U>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match ready!(this.link.poll_signal(cx)) {
                Some(Ok(value)) => match value.downcast::<U>() {
                    Ok(matched) => return Poll::Ready(Some(Ok(*matched))),
                    Err(_) => {
                        this.dropped += 1;
                        trace!(
                            "of_type: dropped element that is not {} ({} so far)",
                            std::any::type_name::<U>(),
                            this.dropped
                        );
                    }
                },
                Some(Err(err)) => return Poll::Ready(Some(Err(err))),
                None => return Poll::Ready(None),
            }
        }
    }
}

// =============================================================================
// Distinct
// =============================================================================

pub(crate) struct Distinct<T, K> {
    link: Link<T>,
    seen: HashSet<K>,
    key: Box<dyn FnMut(&T) -> K + Send>,
}

impl<T, K> Distinct<T, K> {
    pub(crate) fn new(upstream: Upstream<T>, key: Box<dyn FnMut(&T) -> K + Send>) -> Self {
        Self {
            link: Link::new(upstream, "distinct"),
            seen: HashSet::new(),
            key,
        }
    }
}

// No field is structurally pinned.
impl<T, K> Unpin for Distinct<T, K> {}

impl<T, K> Stream for Distinct<T, K>
where
    K: Eq + Hash,
{
    type Item = Signal<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match ready!(this.link.poll_signal(cx)) {
                Some(Ok(item)) => {
                    if this.seen.insert((this.key)(&item)) {
                        return Poll::Ready(Some(Ok(item)));
                    }
                }
                other => return Poll::Ready(other),
            }
        }
    }
}

// =============================================================================
// Take: bounded prefix
// =============================================================================

pub(crate) struct Take<T> {
    link: Link<T>,
    remaining: usize,
}

impl<T> Take<T> {
    pub(crate) fn new(upstream: Upstream<T>, limit: usize) -> Self {
        let mut link = Link::new(upstream, "take");
        if limit == 0 {
            link.cancel();
        }
        Self {
            link,
            remaining: limit,
        }
    }
}

impl<T> Stream for Take<T> {
    type Item = Signal<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.remaining == 0 {
            return Poll::Ready(None);
        }

        let signal = ready!(this.link.poll_signal(cx));
        if let Some(Ok(_)) = &signal {
            this.remaining -= 1;
            // Release as soon as the last wanted element passes, not on the next pull.
            if this.remaining == 0 {
                this.link.cancel();
            }
        }
        Poll::Ready(signal)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

// =============================================================================
// Skip: discard a prefix
// =============================================================================

pub(crate) struct Skip<T> {
    link: Link<T>,
    to_skip: usize,
}

impl<T> Skip<T> {
    pub(crate) fn new(upstream: Upstream<T>, count: usize) -> Self {
        Self {
            link: Link::new(upstream, "skip"),
            to_skip: count,
        }
    }
}

impl<T> Stream for Skip<T> {
    type Item = Signal<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match ready!(this.link.poll_signal(cx)) {
                Some(Ok(_)) if this.to_skip > 0 => this.to_skip -= 1,
                other => return Poll::Ready(other),
            }
        }
    }
}
