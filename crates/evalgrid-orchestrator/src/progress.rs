//! Harness output parsing.
//!
//! The external harness reports progress as plain text lines. Three line
//! shapes carry signal; everything else is opaque log output that is still
//! appended to the job's output buffer:
//!
//! ```text
//! Running suite: <name>
//! Suite complete: <pct>% (<n> metrics, <m> cases)
//! Result saved to: <path>
//! ```
//!
//! Parsing is line-oriented and stateless; [`apply`] folds the extracted
//! signals into a job.

use std::sync::OnceLock;

use regex::Regex;

use crate::job::Job;

fn suite_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Running suite:\s*(.+)").unwrap())
}

fn suite_complete_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Suite complete:\s*([0-9.]+)%\s*\((\d+)\s+metrics?,\s*(\d+)\s+cases?\)")
            .unwrap()
    })
}

fn result_saved_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[Rr]esult saved to:\s*(\S+)").unwrap())
}

/// Completion report for one suite.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteSummary {
    /// Score percentage in `0..=100` as printed by the harness.
    pub percentage: f64,
    pub metrics: u64,
    pub cases: u64,
}

/// Signals extracted from one chunk of harness output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSignals {
    pub suite_started: Option<String>,
    pub suite_completed: Option<SuiteSummary>,
    pub result_path: Option<String>,
}

/// Scan a chunk of output for progress lines. When a line shape appears
/// more than once in the chunk, the last occurrence wins.
pub fn scan(chunk: &str) -> ProgressSignals {
    let mut signals = ProgressSignals::default();
    for line in chunk.lines() {
        if let Some(caps) = suite_start_re().captures(line) {
            signals.suite_started = Some(caps[1].trim().to_string());
        }
        if let Some(caps) = suite_complete_re().captures(line) {
            let parsed = (
                caps[1].parse::<f64>(),
                caps[2].parse::<u64>(),
                caps[3].parse::<u64>(),
            );
            if let (Ok(percentage), Ok(metrics), Ok(cases)) = parsed {
                signals.suite_completed = Some(SuiteSummary {
                    percentage,
                    metrics,
                    cases,
                });
            }
        }
        if let Some(caps) = result_saved_re().captures(line) {
            signals.result_path = Some(caps[1].to_string());
        }
    }
    signals
}

/// Fold extracted signals into the job's progress counters.
///
/// Pure bookkeeping over in-memory state; callers run this under the job
/// store's lock, so it must never touch the filesystem. The result-file
/// read behind `result_path` happens separately via [`read_result_id`].
pub fn apply(signals: &ProgressSignals, job: &mut Job) {
    if let Some(suite) = &signals.suite_started {
        job.current_suite = Some(suite.clone());
    }
    if let Some(summary) = &signals.suite_completed {
        // A completion line without a preceding start line carries a score
        // we cannot attribute to a suite; count it but store no score.
        if let Some(suite) = job.current_suite.clone() {
            job.partial_scores.insert(suite, summary.percentage / 100.0);
        }
        job.completed_suites += 1;
        job.completed_cases += summary.cases;
    }
}

/// Pick up the result identifier from the file the harness reported.
/// Failures are silent: the path may be stale or still being written,
/// and the record will surface through history regardless.
pub async fn read_result_id(path: &str) -> Option<String> {
    let raw = tokio::fs::read_to_string(path).await.ok()?;
    let value: serde_json::Value = serde_json::from_str(&raw).ok()?;
    value
        .get("id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
