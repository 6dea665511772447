// Dispatcher - signal-driven loop pairing idle processors with pending jobs

use crate::application::processors::{ProcessorId, ProcessorsStore};
use crate::domain::{Job, JobStatus};
use crate::error::{BackendError, Result};
use crate::port::{JobStore, Processor};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Pulse buffer size. Bursts beyond this are coalesced: a dropped pulse is
/// always covered by a later one, since every enqueue and every completion
/// pulses again.
const PULSE_BUFFER: usize = 100;

/// Matches pending jobs to idle processors.
///
/// The dispatch loop is a single long-lived task awaiting either a pulse
/// (a "maybe something changed" hint) or quit. Handler runs are spawned
/// tasks. The queue is passed into [`Dispatcher::start_loop`] rather than
/// stored, so the facade owns both sides without a reference cycle.
///
/// Cheap to clone; clones share the same registry and channels.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    store: Mutex<ProcessorsStore>,
    pulse_tx: mpsc::Sender<()>,
    pulse_rx: Mutex<Option<mpsc::Receiver<()>>>,
    // one-shot quit flag for the loop; populated by start_loop, taken by
    // stop_loop
    quit_tx: Mutex<Option<watch::Sender<bool>>>,
    loop_task: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (pulse_tx, pulse_rx) = mpsc::channel(PULSE_BUFFER);
        Self {
            inner: Arc::new(DispatcherInner {
                store: Mutex::new(ProcessorsStore::new()),
                pulse_tx,
                pulse_rx: Mutex::new(Some(pulse_rx)),
                quit_tx: Mutex::new(None),
                loop_task: Mutex::new(None),
            }),
        }
    }

    /// Register a new processor and pulse the loop so it can pick up any
    /// backlog immediately.
    pub fn register_processor(&self, processor: Arc<dyn Processor>) -> ProcessorId {
        let pid = self.inner.store.lock().unwrap().register(processor);
        info!(processor_id = pid, "Processor registered");
        self.pulse();
        pid
    }

    /// Unregister a processor. No more jobs will be assigned to it, but a
    /// job it already started is not cancelled and completes naturally.
    pub fn unregister_processor(&self, pid: ProcessorId) {
        self.inner.store.lock().unwrap().unregister(pid);
        info!(processor_id = pid, "Processor unregistered");
    }

    /// Hint that pending work or idle capacity may have appeared.
    ///
    /// Never blocks: when the buffer is full the pulse is dropped, which is
    /// safe because any subsequent enqueue or completion pulses again.
    pub fn pulse(&self) {
        let _ = self.inner.pulse_tx.try_send(());
    }

    /// Spawn the dispatch loop task.
    ///
    /// Must be called from within a tokio runtime. Calling it a second
    /// time is a no-op.
    pub fn start_loop(&self, queue: Arc<dyn JobStore>) {
        let mut pulses = match self.inner.pulse_rx.lock().unwrap().take() {
            Some(rx) => rx,
            None => {
                warn!("Dispatch loop already started");
                return;
            }
        };

        let (quit_tx, mut quit_rx) = watch::channel(false);
        *self.inner.quit_tx.lock().unwrap() = Some(quit_tx);

        let this = self.clone();
        let handle = tokio::spawn(async move {
            info!("Dispatch loop started");
            loop {
                tokio::select! {
                    // fires on the quit signal, or when its sender is gone
                    _ = quit_rx.changed() => {
                        info!("Dispatch loop stopping");
                        break;
                    }
                    pulse = pulses.recv() => {
                        if pulse.is_none() {
                            break;
                        }
                        if let Err(e) = this.assign_jobs(&queue) {
                            error!(error = %e, "Job assignment failed");
                        }
                    }
                }
            }
        });
        *self.inner.loop_task.lock().unwrap() = Some(handle);
    }

    /// Signal the loop to exit. In-flight handler runs are not cancelled;
    /// they keep going until their own completion.
    pub fn stop_loop(&self) {
        if let Some(quit) = self.inner.quit_tx.lock().unwrap().take() {
            let _ = quit.send(true);
        }
    }

    /// Assign pending jobs to free processors, one dequeue per idle
    /// processor. The store mutex is held across the whole burst so a
    /// concurrent unregister or a duplicate assignment cannot slip in;
    /// handler execution itself stays parallel.
    fn assign_jobs(&self, queue: &Arc<dyn JobStore>) -> Result<()> {
        let mut store = self.inner.store.lock().unwrap();
        for pid in store.available_ids() {
            self.assign_one(&mut store, queue, pid)?;
        }
        Ok(())
    }

    /// Assign one pending job to processor `pid` and start the run.
    /// Only call with the store mutex held, from `assign_jobs`.
    fn assign_one(
        &self,
        store: &mut ProcessorsStore,
        queue: &Arc<dyn JobStore>,
        pid: ProcessorId,
    ) -> Result<()> {
        let processor = store
            .get(pid)
            .ok_or_else(|| BackendError::NotFound(format!("processor {} not found", pid)))?;

        let job = match queue.dequeue_job()? {
            Some(j) => j,
            // no jobs to assign
            None => return Ok(()),
        };

        if let Some(busy_with) = store.processing_job(pid) {
            return Err(BackendError::Conflict(format!(
                "cannot assign job {} to processor {}: busy with job {}",
                job.id, pid, busy_with
            )));
        }

        debug!(job_id = job.id, processor_id = pid, "Assigning job");
        store.set_processing(pid, job.id);
        tokio::spawn(self.clone().run_job(Arc::clone(queue), pid, processor, job));

        Ok(())
    }

    /// Run a job on its processor and move it to the right terminal queue.
    ///
    /// The handler runs on a nested task so a panicking processor cannot
    /// take the processing-map entry down with it; a panic is recorded as a
    /// failed run.
    async fn run_job(
        self,
        queue: Arc<dyn JobStore>,
        pid: ProcessorId,
        processor: Arc<dyn Processor>,
        job: Job,
    ) {
        let job = Arc::new(job);
        let job_for_run = Arc::clone(&job);
        let handle = tokio::spawn(async move { processor.process(&job_for_run).await });

        let status = match handle.await {
            Ok(Ok(())) => JobStatus::Complete,
            Ok(Err(e)) => {
                error!(job_id = job.id, processor_id = pid, error = %e, "Processor run failed");
                JobStatus::Failed
            }
            Err(join_err) => {
                error!(job_id = job.id, processor_id = pid, error = ?join_err, "Processor run panicked");
                JobStatus::Failed
            }
        };

        if let Err(e) = queue.mark_job_done(job.id, status) {
            error!(job_id = job.id, status = %status, error = %e, "mark_job_done failed");
        }

        self.processor_done(pid);
    }

    /// Free the processor and pulse the loop so it reconsiders the
    /// now-idle slot.
    fn processor_done(&self, pid: ProcessorId) {
        self.inner.store.lock().unwrap().unset_processing(pid);
        self.pulse();
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
