//! Configuration types: submission requests, targets and expanded units.
//!
//! Wire names are camelCase to match the JSON the evaluation harness and
//! its result files already speak (`tempExtraction`, `runsPerCase`, ...).

use serde::{Deserialize, Serialize};

use crate::domain::error::ValidationError;

/// Suite run when a submission does not name any.
pub const DEFAULT_SUITE: &str = "fact-extraction";

/// Default repetitions per evaluation case.
pub const DEFAULT_RUNS_PER_CASE: u32 = 1;

/// The eight parameters that determine how the LLM under test is called.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    /// LLM provider (e.g. "openai", "anthropic").
    pub provider: String,

    /// Model identifier within the provider.
    pub model: String,

    /// Sampling temperature for the extraction step.
    pub temp_extraction: f64,

    /// Sampling temperature for the dedup step.
    pub temp_dedup: f64,

    /// Sampling temperature for the impact step.
    pub temp_impact: f64,

    /// Sampling temperature for the proposal step.
    pub temp_proposal: f64,

    /// Embeddings model used for similarity (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings_model: Option<String>,

    /// Dedup similarity threshold (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedup_threshold: Option<f64>,
}

/// Per-axis candidate lists for matrix expansion.
///
/// An absent axis degrades to a single candidate drawn from the base target.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MatrixAxes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_extraction: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dedup: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_impact: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_proposal: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings_model: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedup_threshold: Option<Vec<f64>>,
}

fn declared_empty<T>(axis: &Option<Vec<T>>) -> bool {
    axis.as_ref().is_some_and(|candidates| candidates.is_empty())
}

impl MatrixAxes {
    /// First axis declared with an empty candidate list, if any. An empty
    /// list would expand to zero configurations, so it is invalid; an
    /// absent axis degrades to the base target's value instead.
    pub fn empty_axis(&self) -> Option<&'static str> {
        let axes = [
            ("provider", declared_empty(&self.provider)),
            ("model", declared_empty(&self.model)),
            ("tempExtraction", declared_empty(&self.temp_extraction)),
            ("tempDedup", declared_empty(&self.temp_dedup)),
            ("tempImpact", declared_empty(&self.temp_impact)),
            ("tempProposal", declared_empty(&self.temp_proposal)),
            ("embeddingsModel", declared_empty(&self.embeddings_model)),
            ("dedupThreshold", declared_empty(&self.dedup_threshold)),
        ];
        axes.into_iter().find(|(_, empty)| *empty).map(|(axis, _)| axis)
    }
}

/// A benchmark submission body: either a single concrete configuration
/// (just `target`) or a matrix template (`matrix` + `baseTarget`).
///
/// Unknown fields are rejected at the deserialization boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RunRequest {
    /// Unique display name; also the collision key against history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Suites to run, in order. Defaults to `["fact-extraction"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suites: Option<Vec<String>>,

    /// Repetitions per evaluation case. Defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs_per_case: Option<u32>,

    /// Concrete target (single-configuration submissions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,

    /// Candidate lists per axis (matrix submissions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<MatrixAxes>,

    /// Default value per axis when the matrix omits that axis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_target: Option<Target>,
}

impl RunRequest {
    /// Validate submission shape. Shape only: name collisions against
    /// history are the scheduler's concern.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.name {
            Some(n) if !n.trim().is_empty() => {}
            _ => return Err(ValidationError::MissingName),
        }
        if self.target.is_none() && self.base_target.is_none() {
            return Err(ValidationError::MissingTarget);
        }
        if let Some(runs) = self.runs_per_case {
            if runs == 0 {
                return Err(ValidationError::ZeroRunsPerCase);
            }
        }
        if let Some(suites) = &self.suites {
            if suites.is_empty() {
                return Err(ValidationError::EmptySuites);
            }
        }
        if let Some(matrix) = &self.matrix {
            if let Some(axis) = matrix.empty_axis() {
                return Err(ValidationError::EmptyMatrixAxis(axis));
            }
        }
        Ok(())
    }

    /// Suites with the default applied.
    pub fn effective_suites(&self) -> Vec<String> {
        self.suites
            .clone()
            .unwrap_or_else(|| vec![DEFAULT_SUITE.to_string()])
    }

    /// Runs-per-case with the default applied.
    pub fn effective_runs_per_case(&self) -> u32 {
        self.runs_per_case.unwrap_or(DEFAULT_RUNS_PER_CASE)
    }
}

/// One concrete, fully-resolved configuration executed as a single run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Globally unique name (derived for expanded configurations).
    pub name: String,

    /// Suites to run, in order.
    pub suites: Vec<String>,

    /// Repetitions per evaluation case.
    pub runs_per_case: u32,

    /// The LLM parameters under test.
    pub target: Target,
}
