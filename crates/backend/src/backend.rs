// Backend Facade - composes the queue and the dispatcher

use dray_core::application::{Dispatcher, ProcessorId};
use dray_core::domain::{Job, JobStatus};
use dray_core::error::Result;
use dray_core::port::{JobStore, Processor};
use dray_infra_sled::SledQueue;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Embedded job queue backend.
///
/// Owns the durable queue and the dispatcher; neither holds a reference to
/// the other, the queue is handed to the dispatch loop on start. All
/// methods must be called from within a tokio runtime.
pub struct Backend {
    queue: Arc<SledQueue>,
    dispatcher: Dispatcher,
}

impl Backend {
    /// Create a backend over the given data directory. The directory is
    /// created on [`Backend::start`] if it does not exist and must be
    /// owned exclusively by this process.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            queue: Arc::new(SledQueue::new(db_path)),
            dispatcher: Dispatcher::new(),
        }
    }

    /// Open the store and spawn the dispatch loop.
    pub fn start(&self) -> Result<()> {
        self.queue.start()?;
        let queue: Arc<dyn JobStore> = self.queue.clone();
        self.dispatcher.start_loop(queue);
        info!("Backend started");
        Ok(())
    }

    /// Stop the dispatch loop, then release the store.
    ///
    /// No new jobs are assigned after this returns. Handlers already
    /// running are not cancelled; their terminal transition fails against
    /// the closed store and is logged.
    pub fn stop(&self) -> Result<()> {
        self.dispatcher.stop_loop();
        self.queue.stop()?;
        info!("Backend stopped");
        Ok(())
    }

    /// Enqueue a new job and hint the dispatcher.
    pub fn enqueue_job(&self, name: &str, data: Vec<u8>) -> Result<u64> {
        let id = self.queue.enqueue_job(name, data)?;
        // signal that a new job was enqueued
        self.dispatcher.pulse();
        Ok(id)
    }

    /// Register a new processor.
    pub fn register_processor(&self, processor: Arc<dyn Processor>) -> ProcessorId {
        self.dispatcher.register_processor(processor)
    }

    /// Unregister a processor. No more jobs will be assigned to it, but a
    /// job it already started processing is not cancelled.
    pub fn unregister_processor(&self, pid: ProcessorId) {
        self.dispatcher.unregister_processor(pid);
    }

    /// Look up a job record under a specific status.
    pub fn job(&self, status: JobStatus, id: u64) -> Result<Option<Job>> {
        self.queue.job(status, id)
    }

    /// Number of jobs currently under a status.
    pub fn count(&self, status: JobStatus) -> Result<usize> {
        self.queue.count(status)
    }
}
