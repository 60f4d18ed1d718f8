//! `Flux<T>`: a lazy sequence of 0..N elements followed by one terminal signal.
//!
//! Nothing runs until a consumer pulls. Each stage method consumes the flux and
//! returns a new one wrapping it, so a pipeline reads left to right:
//!
//! ```ignore
//! let middle = number_service().skip(100).take(100);
//! ```

use std::any::Any;
use std::fmt;
use std::hash::Hash;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use log::debug;

use crate::error::SequenceError;
use crate::mono::Mono;
use crate::probe::{DemandProbe, Probed};
use crate::stages::{Distinct, Filter, Mashed, OfType, Signal, Skip, Take, Upstream};

pub struct Flux<T> {
    inner: Upstream<T>,
}

impl<T: Send + 'static> Flux<T> {
    // -------------------------------------------------------------------------
    // Sources
    // -------------------------------------------------------------------------

    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Signal<T>> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
        }
    }

    pub fn from_iterable<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_stream(stream::iter(items.into_iter().map(Ok)))
    }

    pub fn empty() -> Self {
        Self::from_stream(stream::empty())
    }

    pub fn error(error: SequenceError) -> Self {
        Self::from_stream(stream::once(future::ready(Err(error))))
    }

    /// Builds the actual source on the first pull.
    pub fn defer<F>(factory: F) -> Self
    where
        F: FnOnce() -> Flux<T> + Send + 'static,
    {
        Self::from_stream(stream::once(async move { factory().inner }).flatten())
    }

    // -------------------------------------------------------------------------
    // Stages
    // -------------------------------------------------------------------------

    pub fn filter<P>(self, mut predicate: P) -> Self
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        Self::from_stream(Filter::new(
            self.inner,
            Box::new(move |item: &T| -> Result<bool, SequenceError> { Ok(predicate(item)) }),
        ))
    }

    /// Like [`Flux::filter`], but the predicate may fail. A failure terminates
    /// the sequence with that error and releases the upstream.
    pub fn try_filter<P>(self, predicate: P) -> Self
    where
        P: FnMut(&T) -> Result<bool, SequenceError> + Send + 'static,
    {
        Self::from_stream(Filter::new(self.inner, Box::new(predicate)))
    }

    /// Emits each element the first time it is seen. Remembers every distinct
    /// element for the lifetime of the sequence.
    pub fn distinct(self) -> Self
    where
        T: Clone + Eq + Hash,
    {
        self.distinct_by(T::clone)
    }

    pub fn distinct_by<K, F>(self, key: F) -> Self
    where
        K: Eq + Hash + Send + 'static,
        F: FnMut(&T) -> K + Send + 'static,
    {
        Self::from_stream(Distinct::new(self.inner, Box::new(key)))
    }

    /// At most the first `limit` elements. The upstream is released right after
    /// the last one, so it is never asked for element `limit + 1`.
    pub fn take(self, limit: usize) -> Self {
        Self::from_stream(Take::new(self.inner, limit))
    }

    pub fn skip(self, count: usize) -> Self {
        Self::from_stream(Skip::new(self.inner, count))
    }

    /// The first element as a [`Mono`]. Pulls exactly once, then drops the upstream.
    pub fn next(self) -> Mono<T> {
        let mut upstream = self.inner;
        Mono::from_future(async move {
            let first = upstream.next().await;
            drop(upstream);
            debug!("next: first signal received, upstream released");
            first.transpose()
        })
    }

    /// Records demand on this point of the pipeline into `probe`.
    pub fn probed(self, probe: &DemandProbe) -> Self {
        Self::from_stream(Probed::new(self.inner, probe.clone()))
    }

    // -------------------------------------------------------------------------
    // Terminals
    // -------------------------------------------------------------------------

    pub fn collect_list(self) -> Mono<Vec<T>> {
        let upstream = self.inner;
        Mono::from_future(async move { upstream.try_collect::<Vec<T>>().await.map(Some) })
    }

    pub fn count(self) -> Mono<usize> {
        let upstream = self.inner;
        Mono::from_future(async move {
            upstream
                .try_fold(0usize, |count, _| future::ready(Ok(count + 1)))
                .await
                .map(Some)
        })
    }

    pub fn into_stream(self) -> BoxStream<'static, Signal<T>> {
        self.inner
    }
}

impl Flux<i32> {
    /// `count` consecutive integers starting at `start`. A range that would run
    /// past `i32::MAX` is rejected up front as a failed sequence.
    pub fn range(start: i32, count: usize) -> Self {
        let last = i64::try_from(count)
            .ok()
            .and_then(|count| i64::from(start).checked_add(count - 1))
            .filter(|last| *last <= i64::from(i32::MAX));

        match last {
            Some(last) => {
                Self::from_iterable((i64::from(start)..=last).filter_map(|n| i32::try_from(n).ok()))
            }
            None => Self::error(SequenceError::upstream(format!(
                "range of {count} from {start} overflows i32"
            ))),
        }
    }
}

impl Flux<Mashed> {
    /// Keeps only the elements whose runtime type is exactly `U`. Anything else
    /// is dropped silently.
    pub fn of_type<U>(self) -> Flux<U>
    where
        U: Any + Send,
    {
        Flux::from_stream(OfType::<U>::new(self.inner))
    }
}

impl<T: Send + 'static> FromIterator<T> for Flux<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_iterable(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T> Stream for Flux<T> {
    type Item = Signal<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl<T> fmt::Debug for Flux<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flux").finish_non_exhaustive()
    }
}
