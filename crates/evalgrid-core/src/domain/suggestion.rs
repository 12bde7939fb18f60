//! Suggestion value objects produced by the comparative analyzer.

use serde::{Deserialize, Serialize};

use crate::domain::config::RunRequest;

/// The seven detection rules a suggestion can originate from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// A metric on the latest run scored below the low-score floor.
    LowScore,

    /// Another historical run beats the latest overall.
    BestConfig,

    /// Significant spread between the best and worst model.
    ModelComparison,

    /// A temperature axis has a clear best value (or untested neighbors).
    TemperatureSweetSpot,

    /// The latest run regressed versus the best historical run.
    Regression,

    /// A suite's average has been strictly declining.
    SuiteDeclining,

    /// Significant spread between the best and worst provider.
    ProviderComparison,
}

/// One labelled endpoint of a gap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GapSide {
    /// Human label (configuration name, model name, ...).
    pub label: String,

    /// Numeric score at this endpoint.
    pub score: f64,
}

/// Quantified difference between a latest value and a reference value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Gap {
    pub latest: GapSide,
    pub reference: GapSide,

    /// `reference.score - latest.score`.
    pub delta: f64,
}

impl Gap {
    pub fn new(latest: GapSide, reference: GapSide) -> Self {
        let delta = reference.score - latest.score;
        Self {
            latest,
            reference,
            delta,
        }
    }
}

/// A ranked, quantified tuning recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Originating rule tag.
    #[serde(rename = "type")]
    pub kind: SuggestionKind,

    /// One-line headline.
    pub title: String,

    /// Short human-readable summary.
    pub message: String,

    /// Longer explanation with the numbers behind the call.
    pub detail: String,

    /// Quantified gap backing the suggestion, when a reference exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<Gap>,

    /// A submission body the operator can resubmit verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_config: Option<RunRequest>,
}
