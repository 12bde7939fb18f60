//! Historical run records as persisted by the evaluation harness.
//!
//! These types mirror the result-file JSON schema. The files are owned and
//! written by the external harness; this crate only reads them, so parsing
//! is lenient about fields it does not know.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::config::Target;

/// Aggregate statistics for one metric within a suite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricAggregate {
    /// Mean score in 0.0–1.0.
    pub mean: f64,
}

/// Per-suite results within a completed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuiteRecord {
    /// Suite identifier.
    pub suite: String,

    /// Metric name → aggregate.
    #[serde(default)]
    pub aggregated: BTreeMap<String, MetricAggregate>,
}

impl SuiteRecord {
    /// Average of all metric means in this suite, if any metrics exist.
    pub fn average_mean(&self) -> Option<f64> {
        if self.aggregated.is_empty() {
            return None;
        }
        let sum: f64 = self.aggregated.values().map(|m| m.mean).sum();
        Some(sum / self.aggregated.len() as f64)
    }
}

/// The originating configuration, as embedded in a result file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordConfig {
    /// Configuration name the run was submitted under.
    pub name: String,
}

/// One completed evaluation run loaded from the result directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    /// Result identifier.
    pub id: String,

    /// When the run completed.
    pub timestamp: DateTime<Utc>,

    /// Originating configuration.
    pub config: RecordConfig,

    /// The LLM parameters the run used.
    pub target: Target,

    /// Overall score in 0.0–1.0.
    pub overall_score: f64,

    /// Per-suite results.
    #[serde(default)]
    pub suites: Vec<SuiteRecord>,
}

impl RunRecord {
    /// Mean per metric name, averaged across every suite that carries it.
    pub fn metric_means(&self) -> BTreeMap<String, f64> {
        let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for suite in &self.suites {
            for (metric, agg) in &suite.aggregated {
                let entry = sums.entry(metric.clone()).or_insert((0.0, 0));
                entry.0 += agg.mean;
                entry.1 += 1;
            }
        }
        sums.into_iter()
            .map(|(metric, (sum, n))| (metric, sum / n as f64))
            .collect()
    }

    /// Average metric mean for a named suite, if present in this run.
    pub fn suite_average(&self, suite: &str) -> Option<f64> {
        self.suites
            .iter()
            .find(|s| s.suite == suite)
            .and_then(SuiteRecord::average_mean)
    }
}
