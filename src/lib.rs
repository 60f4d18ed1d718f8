//! Chapter 3 of the reactive exercises: filtering a sequence.
//!
//! Sequences here are lazy and pull-driven. [`Flux`] carries 0..N elements and
//! [`Mono`] at most one; both end with a single terminal signal, either
//! completion or a [`SequenceError`]. The fixture services in [`fixtures`] feed
//! the exercises in [`exercises`], and [`StepVerifier`] checks what comes out.

pub mod config;
pub mod error;
pub mod exercises;
pub mod fixtures;
pub mod flux;
pub mod mono;
mod probe;
mod stages;
pub mod verifier;

pub use config::{ChapterConfig, ConfigError};
pub use error::{SequenceError, VerifyError};
pub use flux::Flux;
pub use mono::Mono;
pub use probe::DemandProbe;
pub use stages::{Mashed, Signal};
pub use verifier::StepVerifier;
