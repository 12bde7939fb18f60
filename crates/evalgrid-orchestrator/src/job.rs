//! Job lifecycle state.
//!
//! A job owns the full batch of expanded configurations submitted together.
//! State only ever moves forward: `running` → `completed` or `failed`, and a
//! terminal job ignores further transitions so a late supervisor event can
//! never resurrect a cancelled job.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use evalgrid_core::Configuration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque job identifier, printed as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        JobId(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(JobId(Uuid::parse_str(s)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// Mutable execution state for one submitted batch.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub state: JobState,
    /// Expanded configurations, executed in order.
    pub configs: Vec<Configuration>,
    /// Index of the run currently executing.
    pub current_run: usize,
    pub total_runs: usize,
    pub completed_runs: usize,
    pub total_suites: usize,
    pub completed_suites: usize,
    pub completed_cases: u64,
    /// Suite currently announced by the harness, if any.
    pub current_suite: Option<String>,
    /// Completion percentage (0..=1) per finished suite.
    pub partial_scores: BTreeMap<String, f64>,
    /// Accumulated harness output, stdout and stderr interleaved.
    pub output: String,
    /// Identifier of the saved result, once the harness reports one.
    pub result_id: Option<String>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(id: JobId, configs: Vec<Configuration>) -> Self {
        let total_runs = configs.len();
        let total_suites = configs.iter().map(|c| c.suites.len()).sum();
        Job {
            id,
            state: JobState::Running,
            configs,
            current_run: 0,
            total_runs,
            completed_runs: 0,
            total_suites,
            completed_suites: 0,
            completed_cases: 0,
            current_suite: None,
            partial_scores: BTreeMap::new(),
            output: String::new(),
            result_id: None,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Mark failed; no-op once terminal.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.state.is_terminal() {
            return;
        }
        self.state = JobState::Failed;
        self.error = Some(message.into());
        self.finished_at = Some(Utc::now());
    }

    /// Mark completed; no-op once terminal.
    pub fn complete(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = JobState::Completed;
        self.finished_at = Some(Utc::now());
    }

    /// Human-readable label for the run in flight, e.g. `"bench-a (1/4)"`.
    pub fn current_run_label(&self) -> Option<String> {
        self.configs
            .get(self.current_run)
            .map(|c| format!("{} ({}/{})", c.name, self.current_run + 1, self.total_runs))
    }

    /// Immutable status snapshot for the API surface.
    pub fn status(&self) -> JobStatus {
        JobStatus {
            job_id: self.id,
            state: self.state,
            current_run: self.current_run_label(),
            total_runs: self.total_runs,
            completed_runs: self.completed_runs,
            total_suites: self.total_suites,
            completed_suites: self.completed_suites,
            completed_cases: self.completed_cases,
            current_suite: self.current_suite.clone(),
            partial_scores: self.partial_scores.clone(),
            output: self.output.clone(),
            result_id: self.result_id.clone(),
            error: self.error.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Wire-format snapshot of a [`Job`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub job_id: JobId,
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_run: Option<String>,
    pub total_runs: usize,
    pub completed_runs: usize,
    pub total_suites: usize,
    pub completed_suites: usize,
    pub completed_cases: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_suite: Option<String>,
    pub partial_scores: BTreeMap<String, f64>,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}
