//! Benchmark job orchestration for evalgrid.
//!
//! The scheduler expands a submitted request into concrete configurations,
//! drives one external harness process per configuration sequentially, and
//! folds the process output into a live job status. Cancellation is
//! cooperative: the supervisor kills the current child and the driver stops
//! scheduling further runs.

pub mod job;
pub mod progress;
pub mod scheduler;
pub mod store;
pub mod supervisor;

pub use job::{Job, JobId, JobState, JobStatus};
pub use progress::ProgressSignals;
pub use scheduler::{JobScheduler, SchedulerError};
pub use store::{JobStore, MemoryJobStore};
pub use supervisor::{HarnessConfig, RunEvent, RunSupervisor};
