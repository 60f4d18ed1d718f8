//! Chapter 3: filtering a sequence.
//!
//! A sequence may produce many elements, but we are not always interested in all
//! of them. Each exercise below is one short pipeline over a fixture service,
//! checked with a [`StepVerifier`].

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use log::info;

use crate::config::ChapterConfig;
use crate::error::VerifyError;
use crate::fixtures::{
    duplicated_records_service, fragile_service, mashed_data_service, number_service,
    popular_girl_names_service,
};
use crate::verifier::StepVerifier;

// =============================================================================
// Exercises
// =============================================================================

/// Most popular girl names, no longer than 4 characters.
pub async fn girls_are_made_of_sugar_and_spice(timeout: Duration) -> Result<Duration, VerifyError> {
    let short_listed = popular_girl_names_service().filter(|name| name.chars().count() < 5);

    StepVerifier::create(short_listed)
        .with_timeout(timeout)
        .expect_next_values(["Emma", "Ava", "Mia", "Luna", "Ella"].map(String::from))
        .verify_complete()
        .await
}

/// Only the `String` values of a mixed sequence, without a predicate filter.
pub async fn needle_in_a_haystack(timeout: Duration) -> Result<Duration, VerifyError> {
    let strings = mashed_data_service().of_type::<String>();

    StepVerifier::create(strings)
        .with_timeout(timeout)
        .expect_next_values(["1", "String.class"].map(String::from))
        .verify_complete()
        .await
}

/// The service may repeat records; keep each one once.
pub async fn economical(timeout: Duration) -> Result<Duration, VerifyError> {
    let items = duplicated_records_service().distinct();

    StepVerifier::create(items)
        .with_timeout(timeout)
        .expect_next_values(["1", "2", "3", "4", "5"].map(String::from))
        .verify_complete()
        .await
}

/// Only the first element of a fragile service that breaks when pulled twice.
pub async fn watch_out_for_the_spiders(timeout: Duration) -> Result<Duration, VerifyError> {
    let first_result = fragile_service().next();

    StepVerifier::create(first_result)
        .with_timeout(timeout)
        .expect_next("watch_out".to_string())
        .verify_complete()
        .await
}

/// The first 100 of 300 numbers.
pub async fn dont_take_more_than_you_need(timeout: Duration) -> Result<Duration, VerifyError> {
    let numbers = number_service().take(100);

    StepVerifier::create(numbers)
        .with_timeout(timeout)
        .expect_next_count(100)
        .verify_complete()
        .await
}

/// The last 100 of 300 numbers.
pub async fn not_a_binary_search(timeout: Duration) -> Result<Duration, VerifyError> {
    let numbers = number_service().skip(200);

    StepVerifier::create(numbers)
        .with_timeout(timeout)
        .expect_next_matches("i >= 200", |i| *i >= 200)
        .expect_next_count(99)
        .verify_complete()
        .await
}

/// 100 numbers from the middle of 300.
pub async fn golden_middle(timeout: Duration) -> Result<Duration, VerifyError> {
    let numbers = number_service().skip(100).take(100);

    StepVerifier::create(numbers)
        .with_timeout(timeout)
        .expect_next_matches("i >= 100", |i| *i >= 100)
        .expect_next_count(99)
        .verify_complete()
        .await
}

// =============================================================================
// Catalog and runner
// =============================================================================

type Run = fn(Duration) -> BoxFuture<'static, Result<Duration, VerifyError>>;

pub struct Exercise {
    pub name: &'static str,
    pub description: &'static str,
    run: Run,
}

impl Exercise {
    pub async fn run(&self, timeout: Duration) -> Result<Duration, VerifyError> {
        (self.run)(timeout).await
    }
}

#[derive(Debug)]
pub struct ExerciseReport {
    pub name: &'static str,
    pub outcome: Result<Duration, VerifyError>,
}

impl ExerciseReport {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub fn catalog() -> Vec<Exercise> {
    vec![
        Exercise {
            name: "girls_are_made_of_sugar_and_spice",
            description: "filter names shorter than 5 characters",
            run: |t| girls_are_made_of_sugar_and_spice(t).boxed(),
        },
        Exercise {
            name: "needle_in_a_haystack",
            description: "keep only String values",
            run: |t| needle_in_a_haystack(t).boxed(),
        },
        Exercise {
            name: "economical",
            description: "drop duplicated records",
            run: |t| economical(t).boxed(),
        },
        Exercise {
            name: "watch_out_for_the_spiders",
            description: "take the first element of a fragile source",
            run: |t| watch_out_for_the_spiders(t).boxed(),
        },
        Exercise {
            name: "dont_take_more_than_you_need",
            description: "first 100 of 300 numbers",
            run: |t| dont_take_more_than_you_need(t).boxed(),
        },
        Exercise {
            name: "not_a_binary_search",
            description: "last 100 of 300 numbers",
            run: |t| not_a_binary_search(t).boxed(),
        },
        Exercise {
            name: "golden_middle",
            description: "100 numbers from the middle",
            run: |t| golden_middle(t).boxed(),
        },
    ]
}

/// Runs the exercises `config` selects, in catalog order.
pub async fn run_all(config: &ChapterConfig) -> Vec<ExerciseReport> {
    let mut reports = Vec::new();
    for exercise in catalog().into_iter().filter(|e| config.selects(e.name)) {
        info!("running {}: {}", exercise.name, exercise.description);
        let outcome = exercise.run(config.verify_timeout()).await;
        reports.push(ExerciseReport {
            name: exercise.name,
            outcome,
        });
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_exercise_passes() {
        let reports = run_all(&ChapterConfig::default()).await;
        assert_eq!(reports.len(), catalog().len());
        for report in &reports {
            assert!(report.passed(), "{} failed: {:?}", report.name, report.outcome);
        }
    }

    #[tokio::test]
    async fn config_selects_subset() {
        let config = ChapterConfig {
            exercises: vec!["economical".into(), "golden_middle".into()],
            ..ChapterConfig::default()
        };
        let names: Vec<_> = run_all(&config).await.into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["economical", "golden_middle"]);
    }

    #[test]
    fn catalog_names_are_unique() {
        let mut names: Vec<_> = catalog().iter().map(|e| e.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), catalog().len());
    }
}
