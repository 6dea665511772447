// Sled-backed four-state job queue

use crate::codec::{decode_job, encode_job, job_key, queue_key_prefix};
use crate::sequence::Sequence;
use dray_core::domain::{Job, JobStatus};
use dray_core::error::{BackendError, Result};
use dray_core::port::JobStore;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

/// Key of the durable ID counter inside the keyspace.
const SEQUENCE_KEY: &[u8] = b"standard";

/// IDs reserved per sequence chunk.
const SEQUENCE_BANDWIDTH: u64 = 1000;

// Helper to convert sled errors to BackendError with a little structure
fn map_sled_error(err: sled::Error) -> BackendError {
    match &err {
        sled::Error::Io(e) => BackendError::Storage(format!("io: {}", e)),
        sled::Error::Corruption { .. } => BackendError::Storage(format!("corruption: {}", err)),
        sled::Error::ReportableBug(msg) => BackendError::Storage(format!("store bug: {}", msg)),
        _ => BackendError::Storage(err.to_string()),
    }
}

fn map_tx_error(err: TransactionError<BackendError>) -> BackendError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => map_sled_error(e),
    }
}

struct QueueInner {
    db: sled::Db,
    seq: Sequence,
}

/// Persistent four-state queue over a sled keyspace.
///
/// One mutex serializes every multi-step transition, which keeps FIFO
/// behavior deterministic under concurrent dequeues, and doubles as the
/// started/stopped lifecycle marker: operations on a stopped queue fail
/// with a `Storage` error. State transitions are delete-old-key plus
/// set-new-key inside a single sled transaction, so a job record exists
/// under exactly one status key at any observable point.
pub struct SledQueue {
    db_path: PathBuf,
    inner: Mutex<Option<QueueInner>>,
}

impl SledQueue {
    /// Create a queue handle for the given data directory. Nothing is
    /// opened until [`SledQueue::start`].
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            inner: Mutex::new(None),
        }
    }

    /// Open the store and reserve the first ID chunk.
    ///
    /// # Errors
    /// - `Config` if the path is empty
    /// - `Storage` if the store cannot be opened or is already started
    pub fn start(&self) -> Result<()> {
        if self.db_path.as_os_str().is_empty() {
            return Err(BackendError::Config("db path is required".into()));
        }

        let mut guard = self.inner.lock().unwrap();
        if guard.is_some() {
            return Err(BackendError::Storage("queue already started".into()));
        }

        let db = sled::open(&self.db_path).map_err(map_sled_error)?;
        let seq = Sequence::acquire(db.clone(), SEQUENCE_KEY, SEQUENCE_BANDWIDTH)?;
        *guard = Some(QueueInner { db, seq });
        Ok(())
    }

    /// Flush the unused tail of the ID chunk and close the store.
    ///
    /// The handle becomes invalid: a second stop (or any later operation)
    /// fails with a `Storage` error.
    pub fn stop(&self) -> Result<()> {
        let mut inner = self
            .inner
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BackendError::Storage("queue is not started".into()))?;

        inner.seq.release()?;
        inner.db.flush().map_err(map_sled_error)?;
        Ok(())
    }

    /// Look up a job record under a specific status. Mainly for host
    /// inspection and tests.
    pub fn job(&self, status: JobStatus, id: u64) -> Result<Option<Job>> {
        self.with_inner(|inner| {
            let key = job_key(status, id);
            match inner.db.get(key.as_bytes()).map_err(map_sled_error)? {
                Some(bytes) => Ok(Some(decode_job(&bytes)?)),
                None => Ok(None),
            }
        })
    }

    /// Number of jobs currently under a status.
    pub fn count(&self, status: JobStatus) -> Result<usize> {
        self.with_inner(|inner| {
            let prefix = queue_key_prefix(status);
            let mut n = 0;
            for entry in inner.db.scan_prefix(prefix.as_bytes()) {
                entry.map_err(map_sled_error)?;
                n += 1;
            }
            Ok(n)
        })
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut QueueInner) -> Result<T>) -> Result<T> {
        let mut guard = self.inner.lock().unwrap();
        let inner = guard
            .as_mut()
            .ok_or_else(|| BackendError::Storage("queue is not started".into()))?;
        f(inner)
    }
}

impl JobStore for SledQueue {
    fn enqueue_job(&self, name: &str, data: Vec<u8>) -> Result<u64> {
        self.with_inner(|inner| {
            // the ID is consumed even if the write below fails
            let num = inner.seq.next()?;
            let job = Job::new(num + 1, name, data);

            let bytes = encode_job(&job)?;
            let key = job_key(JobStatus::Pending, job.id);
            debug!(key = %key, "Enqueueing job");
            inner.db.insert(key.as_bytes(), bytes).map_err(map_sled_error)?;

            Ok(job.id)
        })
    }

    fn dequeue_job(&self) -> Result<Option<Job>> {
        self.with_inner(|inner| {
            let prefix = queue_key_prefix(JobStatus::Pending);
            // smallest pending key; the queue mutex guarantees no other
            // caller can move it between the scan and the transaction
            let (key, value) = match inner.db.scan_prefix(prefix.as_bytes()).next() {
                Some(entry) => entry.map_err(map_sled_error)?,
                None => return Ok(None),
            };

            let job = decode_job(&value)?;
            let dest = job_key(JobStatus::InProgress, job.id);

            inner
                .db
                .transaction(|tx| {
                    tx.remove(key.clone())?;
                    tx.insert(dest.as_bytes(), value.clone())?;
                    Ok(())
                })
                .map_err(map_tx_error)?;

            debug!(job_id = job.id, "Dequeued job");
            Ok(Some(job))
        })
    }

    fn mark_job_done(&self, id: u64, status: JobStatus) -> Result<()> {
        if !status.is_terminal() {
            return Err(BackendError::Validation(format!(
                "cannot move job {} to non-terminal status {}",
                id, status
            )));
        }

        self.with_inner(|inner| {
            let src = job_key(JobStatus::InProgress, id);
            let dest = job_key(status, id);

            inner
                .db
                .transaction(|tx| {
                    let value = tx.get(src.as_bytes())?.ok_or_else(|| {
                        ConflictableTransactionError::Abort(BackendError::NotFound(format!(
                            "job {} is not in progress",
                            id
                        )))
                    })?;
                    tx.remove(src.as_bytes())?;
                    tx.insert(dest.as_bytes(), value)?;
                    Ok(())
                })
                .map_err(map_tx_error)?;

            debug!(job_id = id, status = %status, "Marked job done");
            Ok(())
        })
    }
}
