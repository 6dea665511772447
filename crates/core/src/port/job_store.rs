// Job Store Port (Interface)

use crate::domain::{Job, JobStatus};
use crate::error::Result;

/// Persistence interface for the four-state job queue.
///
/// Implementations serialize `dequeue_job` and `mark_job_done` internally,
/// so concurrent callers can never pick or move the same record twice.
/// Errors are never retried here; they propagate to the caller.
pub trait JobStore: Send + Sync {
    /// Append a new pending job and return its assigned ID.
    ///
    /// IDs are strictly increasing. A failed write still consumes the ID
    /// (the sequence is gap-tolerant).
    fn enqueue_job(&self, name: &str, data: Vec<u8>) -> Result<u64>;

    /// Atomically move the oldest pending job to in-progress and return it.
    ///
    /// Returns `None` when no pending job exists.
    fn dequeue_job(&self) -> Result<Option<Job>>;

    /// Atomically move an in-progress job to a terminal status.
    ///
    /// # Errors
    /// - `Validation` if `status` is not `Complete` or `Failed`
    /// - `NotFound` if the job is not currently in progress
    fn mark_job_done(&self, id: u64, status: JobStatus) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::BackendError;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct StoreState {
        pending: VecDeque<Job>,
        in_progress: HashMap<u64, Job>,
        complete: HashMap<u64, Job>,
        failed: HashMap<u64, Job>,
    }

    /// In-memory JobStore for dispatcher tests.
    ///
    /// FIFO over a VecDeque; same dequeue/mark semantics as the durable
    /// implementation, minus the disk.
    #[derive(Default)]
    pub struct InMemoryJobStore {
        next_id: AtomicU64,
        state: Mutex<StoreState>,
    }

    impl InMemoryJobStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Jobs currently under a status.
        pub fn count(&self, status: JobStatus) -> usize {
            let state = self.state.lock().unwrap();
            match status {
                JobStatus::Pending => state.pending.len(),
                JobStatus::InProgress => state.in_progress.len(),
                JobStatus::Complete => state.complete.len(),
                JobStatus::Failed => state.failed.len(),
            }
        }

        pub fn job(&self, status: JobStatus, id: u64) -> Option<Job> {
            let state = self.state.lock().unwrap();
            match status {
                JobStatus::Pending => state.pending.iter().find(|j| j.id == id).cloned(),
                JobStatus::InProgress => state.in_progress.get(&id).cloned(),
                JobStatus::Complete => state.complete.get(&id).cloned(),
                JobStatus::Failed => state.failed.get(&id).cloned(),
            }
        }
    }

    impl JobStore for InMemoryJobStore {
        fn enqueue_job(&self, name: &str, data: Vec<u8>) -> Result<u64> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let mut state = self.state.lock().unwrap();
            state.pending.push_back(Job::new(id, name, data));
            Ok(id)
        }

        fn dequeue_job(&self) -> Result<Option<Job>> {
            let mut state = self.state.lock().unwrap();
            let job = match state.pending.pop_front() {
                Some(j) => j,
                None => return Ok(None),
            };
            state.in_progress.insert(job.id, job.clone());
            Ok(Some(job))
        }

        fn mark_job_done(&self, id: u64, status: JobStatus) -> Result<()> {
            if !status.is_terminal() {
                return Err(BackendError::Validation(format!(
                    "cannot move job {} to non-terminal status {}",
                    id, status
                )));
            }
            let mut state = self.state.lock().unwrap();
            let job = state
                .in_progress
                .remove(&id)
                .ok_or_else(|| BackendError::NotFound(format!("job {} is not in progress", id)))?;
            match status {
                JobStatus::Complete => state.complete.insert(id, job),
                JobStatus::Failed => state.failed.insert(id, job),
                _ => unreachable!(),
            };
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::InMemoryJobStore;
    use super::*;
    use crate::error::BackendError;

    #[test]
    fn test_in_memory_store_fifo() {
        let store = InMemoryJobStore::new();
        let id1 = store.enqueue_job("A", vec![]).unwrap();
        let id2 = store.enqueue_job("B", vec![1, 2]).unwrap();
        assert_eq!(id1, 1);
        assert_eq!(id2, 2);

        let job = store.dequeue_job().unwrap().unwrap();
        assert_eq!(job.id, id1);
        assert_eq!(job.name, "A");
        assert_eq!(store.count(JobStatus::Pending), 1);
        assert_eq!(store.count(JobStatus::InProgress), 1);
    }

    #[test]
    fn test_in_memory_store_mark_done_constraints() {
        let store = InMemoryJobStore::new();
        let id = store.enqueue_job("A", vec![]).unwrap();
        store.dequeue_job().unwrap().unwrap();

        let err = store.mark_job_done(id, JobStatus::Pending).unwrap_err();
        assert!(matches!(err, BackendError::Validation(_)));

        let err = store.mark_job_done(99999, JobStatus::Complete).unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));

        store.mark_job_done(id, JobStatus::Complete).unwrap();
        assert_eq!(store.count(JobStatus::Complete), 1);
        assert_eq!(store.count(JobStatus::InProgress), 0);
    }
}
