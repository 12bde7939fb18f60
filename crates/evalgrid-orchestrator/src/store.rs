//! Job storage abstraction.
//!
//! The scheduler mutates jobs through [`JobStore::update`] so the read,
//! modify and write happen under the backend's own lock. Handing out
//! snapshots for mutation would let a cancel race the driver task.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::job::{Job, JobId};

/// Backend-agnostic job storage.
pub trait JobStore: Send + Sync {
    /// Insert or replace a job.
    fn put(&self, job: Job);

    /// Snapshot a job by id.
    fn get(&self, id: JobId) -> Option<Job>;

    /// Remove a job. No-op if absent.
    fn delete(&self, id: JobId);

    /// Atomically mutate a job in place. Returns `false` if the job does
    /// not exist; the closure is not called in that case.
    fn update(&self, id: JobId, f: &mut dyn FnMut(&mut Job)) -> bool;
}

/// In-memory store backed by a `HashMap` behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<Uuid, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for MemoryJobStore {
    fn put(&self, job: Job) {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.insert(job.id.0, job);
    }

    fn get(&self, id: JobId) -> Option<Job> {
        let jobs = self.jobs.lock().unwrap();
        jobs.get(&id.0).cloned()
    }

    fn delete(&self, id: JobId) {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.remove(&id.0);
    }

    fn update(&self, id: JobId, f: &mut dyn FnMut(&mut Job)) -> bool {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.get_mut(&id.0) {
            Some(job) => {
                f(job);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobState;
    use evalgrid_core::{Configuration, Target};

    fn job() -> Job {
        Job::new(
            JobId::new(),
            vec![Configuration {
                name: "bench".to_string(),
                suites: vec!["s1".to_string()],
                runs_per_case: 1,
                target: Target {
                    provider: "openai".to_string(),
                    model: "gpt-4o-mini".to_string(),
                    temp_extraction: 0.2,
                    temp_dedup: 0.1,
                    temp_impact: 0.3,
                    temp_proposal: 0.5,
                    embeddings_model: None,
                    dedup_threshold: None,
                },
            }],
        )
    }

    #[test]
    fn test_put_get_delete() {
        let store = MemoryJobStore::new();
        let job = job();
        let id = job.id;
        store.put(job);
        assert!(store.get(id).is_some());
        store.delete(id);
        assert!(store.get(id).is_none());
    }

    #[test]
    fn test_update_mutates_in_place() {
        let store = MemoryJobStore::new();
        let job = job();
        let id = job.id;
        store.put(job);

        assert!(store.update(id, &mut |job| job.fail("boom")));
        assert_eq!(store.get(id).unwrap().state, JobState::Failed);
        assert!(!store.update(JobId::new(), &mut |_| {}));
    }
}
