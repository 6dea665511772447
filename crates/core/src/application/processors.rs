// Processors Store - registered handlers and their busy/idle state

use crate::port::Processor;
use std::collections::HashMap;
use std::sync::Arc;

/// Identifier of a registered processor. Monotonic within the process,
/// never reused.
pub type ProcessorId = usize;

/// In-memory registry of processors.
///
/// Not internally synchronized: the dispatcher wraps the store in a single
/// mutex and holds it across a whole assignment burst, so registration,
/// lookup and the processing map can never race with an assignment.
#[derive(Default)]
pub struct ProcessorsStore {
    next_processor_id: ProcessorId,
    processors: HashMap<ProcessorId, Arc<dyn Processor>>,
    processing: HashMap<ProcessorId, u64>,
}

impl ProcessorsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new processor and return its ID.
    pub fn register(&mut self, processor: Arc<dyn Processor>) -> ProcessorId {
        self.next_processor_id += 1;
        self.processors.insert(self.next_processor_id, processor);
        self.next_processor_id
    }

    /// Remove a processor. A job it is currently running completes
    /// naturally; the processing entry is cleared by the run task.
    pub fn unregister(&mut self, pid: ProcessorId) {
        self.processors.remove(&pid);
    }

    /// IDs of registered processors not currently running a job.
    /// Iteration order is unspecified; no fairness guarantee.
    pub fn available_ids(&self) -> Vec<ProcessorId> {
        self.processors
            .keys()
            .filter(|pid| !self.processing.contains_key(pid))
            .copied()
            .collect()
    }

    pub fn get(&self, pid: ProcessorId) -> Option<Arc<dyn Processor>> {
        self.processors.get(&pid).cloned()
    }

    /// Whether the processor is currently working on a job.
    pub fn is_busy(&self, pid: ProcessorId) -> bool {
        self.processing.contains_key(&pid)
    }

    /// ID of the job the processor is working on, if any.
    pub fn processing_job(&self, pid: ProcessorId) -> Option<u64> {
        self.processing.get(&pid).copied()
    }

    pub fn set_processing(&mut self, pid: ProcessorId, job_id: u64) {
        self.processing.insert(pid, job_id);
    }

    pub fn unset_processing(&mut self, pid: ProcessorId) {
        self.processing.remove(&pid);
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::processor::mocks::MockProcessor;

    #[test]
    fn test_register_assigns_increasing_ids() {
        let mut store = ProcessorsStore::new();
        let pid1 = store.register(Arc::new(MockProcessor::new_success()));
        let pid2 = store.register(Arc::new(MockProcessor::new_success()));
        assert_eq!(pid1, 1);
        assert_eq!(pid2, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_ids_not_reused_after_unregister() {
        let mut store = ProcessorsStore::new();
        let pid1 = store.register(Arc::new(MockProcessor::new_success()));
        store.unregister(pid1);
        let pid2 = store.register(Arc::new(MockProcessor::new_success()));
        assert_eq!(pid2, pid1 + 1);
        assert!(store.get(pid1).is_none());
        assert!(store.get(pid2).is_some());
    }

    #[test]
    fn test_available_excludes_busy() {
        let mut store = ProcessorsStore::new();
        let pid1 = store.register(Arc::new(MockProcessor::new_success()));
        let pid2 = store.register(Arc::new(MockProcessor::new_success()));

        store.set_processing(pid1, 42);
        assert!(store.is_busy(pid1));
        assert_eq!(store.processing_job(pid1), Some(42));
        assert_eq!(store.available_ids(), vec![pid2]);

        store.unset_processing(pid1);
        let mut available = store.available_ids();
        available.sort_unstable();
        assert_eq!(available, vec![pid1, pid2]);
    }

    #[test]
    fn test_unregister_keeps_processing_entry() {
        // A busy processor unregistered mid-run: no new work is assigned,
        // but the running job's entry stays until the run task clears it.
        let mut store = ProcessorsStore::new();
        let pid = store.register(Arc::new(MockProcessor::new_success()));
        store.set_processing(pid, 7);
        store.unregister(pid);

        assert!(store.get(pid).is_none());
        assert!(store.is_busy(pid));
        assert!(store.available_ids().is_empty());
    }
}
