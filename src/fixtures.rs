//! Fixture services consumed by the chapter's exercises.
//!
//! Every service builds a fresh sequence per call, so one exercise can never
//! observe what another one pulled.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::Stream;
use log::warn;

use crate::error::SequenceError;
use crate::flux::Flux;
use crate::probe::DemandProbe;
use crate::stages::{Mashed, Signal};

pub const POPULAR_GIRL_NAMES: [&str; 15] = [
    "Olivia", "Emma", "Ava", "Charlotte", "Sophia", "Amelia", "Isabella", "Mia", "Evelyn",
    "Harper", "Camila", "Gianna", "Abigail", "Luna", "Ella",
];

pub const DUPLICATED_RECORDS: [&str; 11] = ["1", "1", "2", "3", "3", "4", "5", "5", "5", "1", "2"];

pub const FRAGILE_ELEMENT: &str = "watch_out";

pub const NUMBER_SERVICE_LEN: usize = 300;

pub fn popular_girl_names_service() -> Flux<String> {
    Flux::from_iterable(POPULAR_GIRL_NAMES.map(String::from))
}

/// Values of assorted runtime types. Only `"1"` and `"String.class"` are `String`s;
/// the integer `1` and the `&str` literal are there to be filtered out.
pub fn mashed_data_service() -> Flux<Mashed> {
    Flux::defer(|| {
        let values: Vec<Mashed> = vec![
            Box::new(1i32),
            Box::new(String::from("1")),
            Box::new(2.5f64),
            Box::new("str slice"),
            Box::new(true),
            Box::new(vec![1, 2, 3]),
            Box::new(String::from("String.class")),
            Box::new('c'),
            Box::new(42u64),
        ];
        Flux::from_iterable(values)
    })
}

pub fn duplicated_records_service() -> Flux<String> {
    Flux::from_iterable(DUPLICATED_RECORDS.map(String::from))
}

/// Hands out [`FRAGILE_ELEMENT`] on the first pull and breaks on any later one.
pub fn fragile_service() -> Flux<String> {
    Flux::from_stream(FragileSource::new(FRAGILE_ELEMENT))
}

/// [`fragile_service`] with its demand recorded into the returned probe.
pub fn fragile_service_with_probe() -> (Flux<String>, DemandProbe) {
    let probe = DemandProbe::new();
    (fragile_service().probed(&probe), probe)
}

pub fn number_service() -> Flux<i32> {
    number_service_of(NUMBER_SERVICE_LEN)
}

/// `0..len` in order.
pub fn number_service_of(len: usize) -> Flux<i32> {
    Flux::range(0, len)
}

// =============================================================================
// Single-shot source
// =============================================================================

struct FragileSource {
    element: Option<String>,
    pulls: usize,
    broken: bool,
}

impl FragileSource {
    fn new(element: &str) -> Self {
        Self {
            element: Some(element.to_string()),
            pulls: 0,
            broken: false,
        }
    }
}

impl Stream for FragileSource {
    type Item = Signal<String>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.broken {
            return Poll::Ready(None);
        }

        this.pulls += 1;
        match this.element.take() {
            Some(element) => Poll::Ready(Some(Ok(element))),
            None => {
                warn!("fragile source pulled {} times, breaking", this.pulls);
                this.broken = true;
                Poll::Ready(Some(Err(SequenceError::OverPulled { pulls: this.pulls })))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::StreamExt;

    #[test]
    fn number_service_is_sequential() {
        let numbers = block_on(number_service().collect_list().block()).unwrap().unwrap();
        assert_eq!(numbers.len(), NUMBER_SERVICE_LEN);
        assert!(numbers.iter().enumerate().all(|(i, n)| *n == i as i32));
    }

    #[test]
    fn fragile_service_breaks_on_second_pull() {
        let (mut fragile, probe) = fragile_service_with_probe();
        assert_eq!(
            block_on(StreamExt::next(&mut fragile)),
            Some(Ok(FRAGILE_ELEMENT.to_string()))
        );
        assert_eq!(
            block_on(StreamExt::next(&mut fragile)),
            Some(Err(SequenceError::OverPulled { pulls: 2 }))
        );
        assert_eq!(block_on(StreamExt::next(&mut fragile)), None);
        assert_eq!(probe.pulls(), 2);
        assert!(probe.terminated());
    }

    #[test]
    fn services_are_fresh_per_call() {
        let first = block_on(duplicated_records_service().count().block());
        let second = block_on(duplicated_records_service().count().block());
        assert_eq!(first, Ok(Some(DUPLICATED_RECORDS.len())));
        assert_eq!(first, second);
    }

    #[test]
    fn mashed_data_mixes_types() {
        assert_eq!(block_on(mashed_data_service().count().block()), Ok(Some(9)));
    }
}
