//! End-to-end scheduler tests against scripted shell harnesses.
//!
//! Each test writes a small shell script standing in for the external
//! benchmark binary, submits a request, and polls the job status until it
//! reaches a terminal state.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use evalgrid_core::{
    MatrixAxes, MemoryRunHistory, RecordConfig, RunRecord, RunRequest, Target,
};
use evalgrid_orchestrator::{
    HarnessConfig, JobScheduler, JobState, JobStatus, MemoryJobStore, SchedulerError,
};

fn target() -> Target {
    Target {
        provider: "openai".to_string(),
        model: "gpt-4o-mini".to_string(),
        temp_extraction: 0.2,
        temp_dedup: 0.1,
        temp_impact: 0.3,
        temp_proposal: 0.5,
        embeddings_model: None,
        dedup_threshold: None,
    }
}

fn request(name: &str) -> RunRequest {
    RunRequest {
        name: Some(name.to_string()),
        target: Some(target()),
        ..Default::default()
    }
}

/// Write an executable script acting as the harness binary.
fn fake_harness(dir: &Path, body: &str) -> String {
    let path = dir.join("eval-harness");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path.to_string_lossy().into_owned()
}

fn scheduler(dir: &Path, body: &str) -> (Arc<JobScheduler>, Arc<MemoryRunHistory>) {
    let history = Arc::new(MemoryRunHistory::new());
    let harness = HarnessConfig {
        binary: fake_harness(dir, body),
        scratch_dir: dir.to_path_buf(),
    };
    let scheduler = Arc::new(JobScheduler::new(
        Arc::new(MemoryJobStore::new()),
        history.clone(),
        harness,
    ));
    (scheduler, history)
}

async fn wait_terminal(scheduler: &JobScheduler, status: &JobStatus) -> JobStatus {
    for _ in 0..200 {
        let current = scheduler.status(status.job_id).unwrap();
        if current.state.is_terminal() {
            return current;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("job never reached a terminal state");
}

#[tokio::test]
async fn test_single_run_completes_with_progress() {
    let dir = tempfile::tempdir().unwrap();
    let (scheduler, _) = scheduler(
        dir.path(),
        r#"echo "Running suite: fact-extraction"
echo "Suite complete: 85% (4 metrics, 12 cases)""#,
    );

    let status = scheduler.submit(&request("bench")).await.unwrap();
    assert_eq!(status.state, JobState::Running);
    assert_eq!(status.total_runs, 1);
    assert_eq!(status.total_suites, 1);

    let done = wait_terminal(&scheduler, &status).await;
    assert_eq!(done.state, JobState::Completed);
    assert_eq!(done.completed_runs, 1);
    assert_eq!(done.completed_suites, 1);
    assert_eq!(done.completed_cases, 12);
    assert_eq!(done.partial_scores.get("fact-extraction"), Some(&0.85));
    assert!(done.output.contains("Running suite: fact-extraction"));
    assert!(done.error.is_none());
    assert!(done.finished_at.is_some());
}

#[tokio::test]
async fn test_matrix_failure_stops_the_batch() {
    // Two configs; the harness fails whenever the config names model "b".
    let dir = tempfile::tempdir().unwrap();
    let (scheduler, _) = scheduler(
        dir.path(),
        r#"if grep -q '"model": "b"' "$3"; then
  echo "provider exploded" >&2
  exit 3
fi
echo "Running suite: fact-extraction"
echo "Suite complete: 90% (4 metrics, 10 cases)""#,
    );

    let mut request = request("bench");
    request.matrix = Some(MatrixAxes {
        model: Some(vec!["a".to_string(), "b".to_string()]),
        ..Default::default()
    });
    request.base_target = request.target.take();

    let status = scheduler.submit(&request).await.unwrap();
    assert_eq!(status.total_runs, 2);
    assert_eq!(status.total_suites, 2);

    let done = wait_terminal(&scheduler, &status).await;
    assert_eq!(done.state, JobState::Failed);
    assert_eq!(done.completed_runs, 1);
    assert_eq!(done.error.as_deref(), Some("Run 2/2 failed (exit code 3)"));
    // stderr of the failing run still lands in the output buffer.
    assert!(done.output.contains("provider exploded"));
}

#[tokio::test]
async fn test_cancel_is_immediate_and_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (scheduler, _) = scheduler(dir.path(), "sleep 30");

    let status = scheduler.submit(&request("bench")).await.unwrap();
    // Give the driver a moment to spawn the child.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let cancelled = scheduler.cancel(status.job_id).unwrap();
    assert_eq!(cancelled.state, JobState::Failed);
    assert_eq!(cancelled.error.as_deref(), Some("Cancelled by user"));

    // A second cancel finds the job already terminal.
    assert!(matches!(
        scheduler.cancel(status.job_id),
        Err(SchedulerError::InvalidState)
    ));

    // The driver winds down without resurrecting the job.
    let done = wait_terminal(&scheduler, &status).await;
    assert_eq!(done.state, JobState::Failed);
    assert_eq!(done.error.as_deref(), Some("Cancelled by user"));
}

#[tokio::test]
async fn test_name_conflict_rejects_the_whole_batch() {
    let dir = tempfile::tempdir().unwrap();
    let (scheduler, history) = scheduler(dir.path(), "exit 0");

    history.push(RunRecord {
        id: "res-1".to_string(),
        timestamp: chrono::Utc::now(),
        config: RecordConfig {
            name: "bench-openai-b-t0.2".to_string(),
        },
        target: target(),
        overall_score: 0.7,
        suites: Vec::new(),
    });

    let mut request = request("bench");
    request.matrix = Some(MatrixAxes {
        model: Some(vec!["a".to_string(), "b".to_string()]),
        ..Default::default()
    });
    request.base_target = request.target.take();

    // One of two derived names collides; nothing may run.
    match scheduler.submit(&request).await {
        Err(SchedulerError::NameConflict { conflicts }) => {
            assert_eq!(conflicts, vec!["bench-openai-b-t0.2".to_string()]);
        }
        other => panic!("expected name conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_request_is_rejected_before_anything_runs() {
    let dir = tempfile::tempdir().unwrap();
    let (scheduler, _) = scheduler(dir.path(), "exit 0");

    let mut bad = request("bench");
    bad.target = None;
    assert!(matches!(
        scheduler.submit(&bad).await,
        Err(SchedulerError::Validation(_))
    ));

    assert!(matches!(
        scheduler.status(evalgrid_orchestrator::JobId::new()),
        Err(SchedulerError::NotFound)
    ));
}

#[tokio::test]
async fn test_result_id_is_picked_up_from_saved_file() {
    let dir = tempfile::tempdir().unwrap();
    let result_path = dir.path().join("result.json");
    std::fs::write(&result_path, r#"{"id": "res-xyz"}"#).unwrap();

    let (scheduler, _) = scheduler(
        dir.path(),
        &format!(
            r#"echo "Running suite: fact-extraction"
echo "Suite complete: 100% (2 metrics, 5 cases)"
echo "Result saved to: {}""#,
            result_path.display()
        ),
    );

    let status = scheduler.submit(&request("bench")).await.unwrap();
    let done = wait_terminal(&scheduler, &status).await;
    assert_eq!(done.state, JobState::Completed);
    assert_eq!(done.result_id.as_deref(), Some("res-xyz"));
}
