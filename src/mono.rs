use std::fmt;
use std::future::Future;

use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};

use crate::error::SequenceError;
use crate::flux::Flux;

/// A lazy sequence of at most one element.
///
/// Resolves to `Ok(Some(value))`, `Ok(None)` for an empty completion, or the
/// terminal error.
pub struct Mono<T> {
    inner: BoxFuture<'static, Result<Option<T>, SequenceError>>,
}

impl<T: Send + 'static> Mono<T> {
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<Option<T>, SequenceError>> + Send + 'static,
    {
        Self {
            inner: future.boxed(),
        }
    }

    pub fn just(value: T) -> Self {
        Self::from_future(future::ready(Ok(Some(value))))
    }

    pub fn empty() -> Self {
        Self::from_future(future::ready(Ok(None)))
    }

    pub fn error(error: SequenceError) -> Self {
        Self::from_future(future::ready(Err(error)))
    }

    /// Drives the sequence to its terminal signal.
    pub async fn block(self) -> Result<Option<T>, SequenceError> {
        self.inner.await
    }

    pub fn into_flux(self) -> Flux<T> {
        let signal = stream::once(self.inner).filter_map(|outcome| future::ready(outcome.transpose()));
        Flux::from_stream(signal)
    }
}

impl<T: Send + 'static> From<Mono<T>> for Flux<T> {
    fn from(mono: Mono<T>) -> Self {
        mono.into_flux()
    }
}

impl<T> fmt::Debug for Mono<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mono").finish_non_exhaustive()
    }
}
