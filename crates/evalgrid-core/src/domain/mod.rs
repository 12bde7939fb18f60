//! Domain models for evalgrid.
//!
//! Canonical definitions for the core entities:
//! - `Target` / `RunRequest` / `Configuration`: what gets submitted and run
//! - `RunRecord`: one completed evaluation as persisted by the harness
//! - `Suggestion`: a quantified tuning recommendation

pub mod config;
pub mod error;
pub mod record;
pub mod suggestion;

pub use config::{Configuration, MatrixAxes, RunRequest, Target, DEFAULT_SUITE};
pub use error::ValidationError;
pub use record::{MetricAggregate, RecordConfig, RunRecord, SuiteRecord};
pub use suggestion::{Gap, GapSide, Suggestion, SuggestionKind};
