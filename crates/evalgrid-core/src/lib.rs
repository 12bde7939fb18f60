//! Evalgrid Core Library
//!
//! Domain layer for the evalgrid benchmark orchestrator:
//! - Configuration and matrix-expansion types (`domain::config`, `expand`)
//! - Historical run records as persisted by the evaluation harness
//! - The comparative analyzer that mines the run corpus for tuning
//!   suggestions (`analyzer`)
//! - The `RunHistory` abstraction over the result-file directory

pub mod analyzer;
pub mod domain;
pub mod expand;
pub mod history;
pub mod telemetry;

pub use analyzer::{analyze, ANALYSIS_WINDOW};
pub use domain::{
    Configuration, Gap, GapSide, MatrixAxes, MetricAggregate, RecordConfig, RunRecord, RunRequest,
    SuiteRecord, Suggestion, SuggestionKind, Target, ValidationError,
};
pub use expand::{duplicate_names, expand};
pub use history::{FsRunHistory, HistoryError, MemoryRunHistory, RunHistory};
pub use telemetry::init_tracing;

/// Evalgrid version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
