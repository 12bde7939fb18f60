//! One external harness process per configuration.
//!
//! The supervisor writes the configuration to a scratch file, spawns the
//! harness against it, forwards every output line as an event, and waits on
//! the child alongside the cancellation signal. It never touches the job
//! itself; the scheduler's driver task is the single consumer that folds
//! events into job state.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use evalgrid_core::Configuration;

use crate::job::JobId;

/// How to invoke the external benchmark harness.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Harness executable, resolved through `PATH` unless absolute.
    pub binary: String,
    /// Directory for transient per-run configuration files.
    pub scratch_dir: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            binary: "eval-harness".to_string(),
            scratch_dir: std::env::temp_dir(),
        }
    }
}

/// Events a supervised run emits towards the driver task.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// One line of harness output (stdout or stderr).
    Output { chunk: String },
    /// The harness exited with status zero.
    Completed { run_index: usize },
    /// The harness exited non-zero or could not be spawned.
    Failed { run_index: usize, message: String },
}

pub struct RunSupervisor;

impl RunSupervisor {
    /// Run one configuration to completion or cancellation.
    ///
    /// Emits `Output` events while the child runs, then exactly one of
    /// `Completed`/`Failed` — except on cancellation, where the child is
    /// killed and no terminal event is sent (the job is already failed by
    /// the canceller).
    pub async fn execute(
        harness: &HarnessConfig,
        job_id: JobId,
        run_index: usize,
        total_runs: usize,
        config: &Configuration,
        events: mpsc::Sender<RunEvent>,
        mut cancel: watch::Receiver<bool>,
    ) {
        let config_path = harness
            .scratch_dir
            .join(format!("evalgrid-{job_id}-run-{run_index}.json"));

        let payload = match serde_json::to_vec_pretty(config) {
            Ok(payload) => payload,
            Err(e) => {
                let _ = events
                    .send(RunEvent::Failed {
                        run_index,
                        message: format!("failed to encode configuration: {e}"),
                    })
                    .await;
                return;
            }
        };
        if let Err(e) = tokio::fs::write(&config_path, payload).await {
            let _ = events
                .send(RunEvent::Failed {
                    run_index,
                    message: format!("failed to write {}: {e}", config_path.display()),
                })
                .await;
            return;
        }

        // Already cancelled before the child ever starts.
        if *cancel.borrow() {
            let _ = tokio::fs::remove_file(&config_path).await;
            return;
        }

        tracing::info!(
            job_id = %job_id,
            run = run_index + 1,
            total = total_runs,
            config = %config.name,
            "starting harness run"
        );

        let spawned = Command::new(&harness.binary)
            .arg("run")
            .arg("--config")
            .arg(&config_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                let _ = tokio::fs::remove_file(&config_path).await;
                let _ = events
                    .send(RunEvent::Failed {
                        run_index,
                        message: format!("failed to spawn '{}': {e}", harness.binary),
                    })
                    .await;
                return;
            }
        };

        let stdout = child.stdout.take().map(|out| forward(out, events.clone()));
        let stderr = child.stderr.take().map(|err| forward(err, events.clone()));

        let outcome = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancel.changed() => {
                if *cancel.borrow() {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    None
                } else {
                    Some(child.wait().await)
                }
            }
        };

        // Drain forwarders so no output is lost behind the exit status.
        if let Some(task) = stdout {
            let _ = task.await;
        }
        if let Some(task) = stderr {
            let _ = task.await;
        }
        let _ = tokio::fs::remove_file(&config_path).await;

        match outcome {
            None => {
                tracing::info!(job_id = %job_id, run = run_index + 1, "run cancelled");
            }
            Some(Err(e)) => {
                let _ = events
                    .send(RunEvent::Failed {
                        run_index,
                        message: format!("failed to wait on harness: {e}"),
                    })
                    .await;
            }
            Some(Ok(status)) if status.success() => {
                let _ = events.send(RunEvent::Completed { run_index }).await;
            }
            Some(Ok(status)) => {
                let code = status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                let _ = events
                    .send(RunEvent::Failed {
                        run_index,
                        message: format!(
                            "Run {}/{} failed (exit code {})",
                            run_index + 1,
                            total_runs,
                            code
                        ),
                    })
                    .await;
            }
        }
    }
}

/// Forward each line of a child stream as an `Output` event.
fn forward<R>(reader: R, events: mpsc::Sender<RunEvent>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if events.send(RunEvent::Output { chunk: line }).await.is_err() {
                break;
            }
        }
    })
}
