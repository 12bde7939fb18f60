//! Job scheduling.
//!
//! `submit` expands the request, rejects name conflicts up front, stores a
//! `running` job and spawns a driver task. The driver executes the expanded
//! configurations strictly in order, one harness process at a time, and is
//! the only consumer of supervisor events. Cancellation marks the job
//! failed first and only then signals the supervisor, so a status read
//! after a successful cancel can never observe `running`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::{mpsc, watch};

use evalgrid_core::{
    duplicate_names, expand, Configuration, HistoryError, RunHistory, RunRequest, ValidationError,
};

use crate::job::{Job, JobId, JobState, JobStatus};
use crate::progress;
use crate::store::JobStore;
use crate::supervisor::{HarnessConfig, RunEvent, RunSupervisor};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("configuration name(s) already exist: {}", conflicts.join(", "))]
    NameConflict { conflicts: Vec<String> },

    #[error("job not found")]
    NotFound,

    #[error("job is not running")]
    InvalidState,

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Orchestrates benchmark jobs against the external harness.
pub struct JobScheduler {
    store: Arc<dyn JobStore>,
    history: Arc<dyn RunHistory>,
    harness: HarnessConfig,
    /// Cancellation senders for in-flight jobs, removed when a job ends.
    controls: Mutex<HashMap<JobId, watch::Sender<bool>>>,
}

impl JobScheduler {
    pub fn new(
        store: Arc<dyn JobStore>,
        history: Arc<dyn RunHistory>,
        harness: HarnessConfig,
    ) -> Self {
        JobScheduler {
            store,
            history,
            harness,
            controls: Mutex::new(HashMap::new()),
        }
    }

    /// Expand and start a request. Returns the initial status snapshot;
    /// execution continues in a background task.
    ///
    /// The whole batch is rejected when any derived name collides with
    /// history or with another name in the same batch; no job is created
    /// and nothing executes.
    pub async fn submit(self: &Arc<Self>, request: &RunRequest) -> Result<JobStatus, SchedulerError> {
        let configs = expand(request)?;

        let mut conflicts = duplicate_names(&configs);
        let known = self.history.known_names().await?;
        for config in &configs {
            if known.contains(&config.name) {
                conflicts.push(config.name.clone());
            }
        }
        conflicts.sort();
        conflicts.dedup();
        if !conflicts.is_empty() {
            return Err(SchedulerError::NameConflict { conflicts });
        }

        let job = Job::new(JobId::new(), configs.clone());
        let id = job.id;
        let status = job.status();
        self.store.put(job);

        let (cancel_tx, cancel_rx) = watch::channel(false);
        self.controls.lock().unwrap().insert(id, cancel_tx);

        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            scheduler.drive(id, configs, cancel_rx).await;
        });

        Ok(status)
    }

    /// Execute the batch sequentially, folding supervisor events into the
    /// stored job. Runs until the batch finishes or the job turns terminal.
    async fn drive(&self, id: JobId, configs: Vec<Configuration>, cancel_rx: watch::Receiver<bool>) {
        let total_runs = configs.len();
        for (index, config) in configs.iter().enumerate() {
            let mut still_running = false;
            self.store.update(id, &mut |job| {
                still_running = !job.state.is_terminal();
                if still_running {
                    job.current_run = index;
                    job.current_suite = None;
                }
            });
            if !still_running {
                break;
            }

            let (events_tx, mut events_rx) = mpsc::channel(64);
            let supervisor = {
                let harness = self.harness.clone();
                let config = config.clone();
                let cancel_rx = cancel_rx.clone();
                tokio::spawn(async move {
                    RunSupervisor::execute(
                        &harness,
                        id,
                        index,
                        total_runs,
                        &config,
                        events_tx,
                        cancel_rx,
                    )
                    .await;
                })
            };

            let mut run_ok = false;
            while let Some(event) = events_rx.recv().await {
                match event {
                    RunEvent::Output { chunk } => {
                        // The result-file read is disk IO; do it before
                        // taking the store lock.
                        let signals = progress::scan(&chunk);
                        let result_id = match &signals.result_path {
                            Some(path) => progress::read_result_id(path).await,
                            None => None,
                        };
                        self.store.update(id, &mut |job| {
                            job.output.push_str(&chunk);
                            job.output.push('\n');
                            progress::apply(&signals, job);
                            if let Some(result_id) = &result_id {
                                job.result_id = Some(result_id.clone());
                            }
                        });
                    }
                    RunEvent::Completed { .. } => {
                        self.store.update(id, &mut |job| {
                            if !job.state.is_terminal() {
                                job.completed_runs += 1;
                            }
                        });
                        run_ok = true;
                    }
                    RunEvent::Failed { message, .. } => {
                        tracing::warn!(job_id = %id, run = index + 1, %message, "run failed");
                        self.store.update(id, &mut |job| job.fail(message.clone()));
                        run_ok = false;
                    }
                }
            }
            let _ = supervisor.await;

            if !run_ok {
                break;
            }
        }

        self.store.update(id, &mut |job| {
            if job.state == JobState::Running && job.completed_runs == job.total_runs {
                job.complete();
                tracing::info!(job_id = %id, runs = job.total_runs, "job completed");
            }
        });
        self.controls.lock().unwrap().remove(&id);
    }

    /// Status snapshot for a job.
    pub fn status(&self, id: JobId) -> Result<JobStatus, SchedulerError> {
        self.store
            .get(id)
            .map(|job| job.status())
            .ok_or(SchedulerError::NotFound)
    }

    /// Cancel a running job.
    ///
    /// The job is failed before the kill signal goes out; a second cancel
    /// of the same job reports `InvalidState`.
    pub fn cancel(&self, id: JobId) -> Result<JobStatus, SchedulerError> {
        let mut cancelled = false;
        let found = self.store.update(id, &mut |job| {
            if job.state == JobState::Running {
                job.fail("Cancelled by user");
                cancelled = true;
            }
        });
        if !found {
            return Err(SchedulerError::NotFound);
        }
        if !cancelled {
            return Err(SchedulerError::InvalidState);
        }

        if let Some(control) = self.controls.lock().unwrap().get(&id) {
            let _ = control.send(true);
        }
        tracing::info!(job_id = %id, "job cancelled");
        self.status(id)
    }
}
