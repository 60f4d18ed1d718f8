//! Step-by-step verification of a sequence.
//!
//! A [`StepVerifier`] is a script of expectations about the next signals of a
//! sequence, finished by the expected terminal signal. Each pull runs under a
//! `tokio::time::timeout`, so verification must be awaited inside a Tokio
//! runtime (`#[tokio::test]` or `#[tokio::main]`); `futures::executor::block_on`
//! alone panics with "there is no reactor running".
//!
//! ```ignore
//! StepVerifier::create(number_service().skip(200))
//!     .expect_next_matches("at least 200", |i| *i >= 200)
//!     .expect_next_count(99)
//!     .verify_complete()
//!     .await?;
//! ```

use std::fmt::Debug;
use std::time::{Duration, Instant};

use futures::stream::StreamExt;
use log::{debug, trace};

use crate::error::{SequenceError, VerifyError};
use crate::flux::Flux;
use crate::stages::Signal;

type Check<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

enum Expectation<T> {
    Next(T),
    Count(usize),
    Matches { description: String, check: Check<T> },
    ConsumeWhile(Check<T>),
}

/// Needs a Tokio runtime with the time driver enabled to verify.
pub struct StepVerifier<T> {
    source: Flux<T>,
    expectations: Vec<Expectation<T>>,
    timeout: Duration,
}

impl<T> StepVerifier<T>
where
    T: Debug + PartialEq + Send + 'static,
{
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

    pub fn create(source: impl Into<Flux<T>>) -> Self {
        Self {
            source: source.into(),
            expectations: Vec::new(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Upper bound on how long any single pull may take.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn expect_next(mut self, value: T) -> Self {
        self.expectations.push(Expectation::Next(value));
        self
    }

    pub fn expect_next_values(mut self, values: impl IntoIterator<Item = T>) -> Self {
        self.expectations
            .extend(values.into_iter().map(Expectation::Next));
        self
    }

    /// Expects `count` more elements, whatever their values.
    pub fn expect_next_count(mut self, count: usize) -> Self {
        self.expectations.push(Expectation::Count(count));
        self
    }

    pub fn expect_next_matches<F>(mut self, description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.expectations.push(Expectation::Matches {
            description: description.into(),
            check: Box::new(check),
        });
        self
    }

    /// Consumes elements while `check` holds. The first element that fails it
    /// is left for the next expectation.
    pub fn then_consume_while<F>(mut self, check: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.expectations
            .push(Expectation::ConsumeWhile(Box::new(check)));
        self
    }

    /// Runs the script and expects completion with no error and nothing left over.
    pub async fn verify_complete(self) -> Result<Duration, VerifyError> {
        let started = Instant::now();
        let mut cursor = self.run().await?;
        match cursor.pull().await? {
            None => {
                let elapsed = started.elapsed();
                debug!("verified completion after {} steps in {:?}", cursor.step, elapsed);
                Ok(elapsed)
            }
            Some(Ok(extra)) => Err(VerifyError::UnexpectedElement {
                step: cursor.step + 1,
                actual: format!("{extra:?}"),
            }),
            Some(Err(error)) => Err(VerifyError::UnexpectedError {
                step: cursor.step,
                error,
            }),
        }
    }

    /// Runs the script and expects the sequence to fail; returns the failure.
    pub async fn verify_error(self) -> Result<SequenceError, VerifyError> {
        let mut cursor = self.run().await?;
        match cursor.pull().await? {
            Some(Err(error)) => Ok(error),
            None => Err(VerifyError::ExpectedErrorButCompleted),
            Some(Ok(extra)) => Err(VerifyError::UnexpectedElement {
                step: cursor.step + 1,
                actual: format!("{extra:?}"),
            }),
        }
    }

    pub async fn verify_error_matches<F>(self, check: F) -> Result<SequenceError, VerifyError>
    where
        F: FnOnce(&SequenceError) -> bool,
    {
        let error = self.verify_error().await?;
        if check(&error) {
            Ok(error)
        } else {
            Err(VerifyError::ErrorMismatch { error })
        }
    }

    async fn run(self) -> Result<Cursor<T>, VerifyError> {
        let mut cursor = Cursor {
            source: self.source,
            lookahead: None,
            timeout: self.timeout,
            step: 0,
        };

        for expectation in self.expectations {
            cursor.step += 1;
            match expectation {
                Expectation::Next(expected) => {
                    let actual = cursor.require_element().await?;
                    if actual != expected {
                        return Err(VerifyError::UnexpectedValue {
                            step: cursor.step,
                            expected: format!("{expected:?}"),
                            actual: format!("{actual:?}"),
                        });
                    }
                }
                Expectation::Count(count) => {
                    for _ in 0..count {
                        cursor.require_element().await?;
                    }
                }
                Expectation::Matches { description, check } => {
                    let actual = cursor.require_element().await?;
                    if !check(&actual) {
                        return Err(VerifyError::PredicateFailed {
                            step: cursor.step,
                            description,
                            actual: format!("{actual:?}"),
                        });
                    }
                }
                Expectation::ConsumeWhile(check) => {
                    let mut consumed = 0usize;
                    loop {
                        match cursor.pull().await? {
                            Some(Ok(item)) if check(&item) => consumed += 1,
                            other => {
                                cursor.lookahead = Some(other);
                                break;
                            }
                        }
                    }
                    trace!("step {}: consumed {} elements", cursor.step, consumed);
                }
            }
        }

        Ok(cursor)
    }
}

struct Cursor<T> {
    source: Flux<T>,
    lookahead: Option<Option<Signal<T>>>,
    timeout: Duration,
    step: usize,
}

impl<T> Cursor<T> {
    async fn pull(&mut self) -> Result<Option<Signal<T>>, VerifyError> {
        if let Some(signal) = self.lookahead.take() {
            return Ok(signal);
        }
        tokio::time::timeout(self.timeout, StreamExt::next(&mut self.source))
            .await
            .map_err(|_| VerifyError::Timeout {
                step: self.step,
                after: self.timeout,
            })
    }

    async fn require_element(&mut self) -> Result<T, VerifyError> {
        match self.pull().await? {
            Some(Ok(item)) => Ok(item),
            Some(Err(error)) => Err(VerifyError::UnexpectedError {
                step: self.step,
                error,
            }),
            None => Err(VerifyError::UnexpectedComplete { step: self.step }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mono::Mono;
    use futures::stream;

    #[tokio::test]
    async fn mismatched_value_reports_step() {
        let err = StepVerifier::create(Flux::range(0, 3))
            .expect_next_values([0, 5])
            .verify_complete()
            .await
            .unwrap_err();

        assert_eq!(
            err,
            VerifyError::UnexpectedValue {
                step: 2,
                expected: "5".into(),
                actual: "1".into(),
            }
        );
    }

    #[tokio::test]
    async fn early_completion_is_reported() {
        let err = StepVerifier::create(Flux::range(0, 3))
            .expect_next_count(4)
            .verify_complete()
            .await
            .unwrap_err();
        assert_eq!(err, VerifyError::UnexpectedComplete { step: 1 });
    }

    #[tokio::test]
    async fn leftover_element_fails_completion() {
        let err = StepVerifier::create(Flux::range(0, 3))
            .expect_next_count(2)
            .verify_complete()
            .await
            .unwrap_err();
        assert_eq!(
            err,
            VerifyError::UnexpectedElement {
                step: 2,
                actual: "2".into(),
            }
        );
    }

    #[tokio::test]
    async fn failed_predicate_names_description() {
        let err = StepVerifier::create(Flux::range(5, 3))
            .expect_next_matches("even", |i| i % 2 == 0)
            .verify_complete()
            .await
            .unwrap_err();

        assert_eq!(
            err,
            VerifyError::PredicateFailed {
                step: 1,
                description: "even".into(),
                actual: "5".into(),
            }
        );
    }

    #[tokio::test]
    async fn consume_while_leaves_first_mismatch() {
        StepVerifier::create(Flux::range(0, 10))
            .then_consume_while(|i| *i < 7)
            .expect_next_values([7, 8, 9])
            .verify_complete()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn verify_error_returns_failure() {
        let failing = Flux::from_stream(stream::iter(vec![
            Ok(1),
            Err(SequenceError::upstream("lost connection")),
        ]));

        let error = StepVerifier::create(failing)
            .expect_next(1)
            .verify_error_matches(|e| matches!(e, SequenceError::Upstream(_)))
            .await
            .unwrap();
        assert_eq!(error, SequenceError::upstream("lost connection"));
    }

    #[tokio::test]
    async fn rejected_error_is_a_mismatch() {
        let err = StepVerifier::create(Flux::<i32>::error(SequenceError::upstream("x")))
            .verify_error_matches(|e| matches!(e, SequenceError::Predicate(_)))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            VerifyError::ErrorMismatch {
                error: SequenceError::upstream("x"),
            }
        );
    }

    #[tokio::test]
    async fn verify_error_on_completion_fails() {
        let err = StepVerifier::create(Mono::just(1))
            .expect_next(1)
            .verify_error()
            .await
            .unwrap_err();
        assert_eq!(err, VerifyError::ExpectedErrorButCompleted);
    }

    #[tokio::test]
    async fn stalled_source_times_out() {
        let err = StepVerifier::create(Flux::<i32>::from_stream(stream::pending()))
            .with_timeout(Duration::from_millis(20))
            .expect_next(1)
            .verify_complete()
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::Timeout { step: 1, .. }));
    }
}
