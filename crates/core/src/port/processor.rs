// Processor Port
// Abstraction for the host-supplied job handlers

use crate::domain::Job;
use async_trait::async_trait;
use thiserror::Error;

/// Failure signalled by a processor run.
///
/// Surfaced only as the reason a job moves to the failed queue; the job is
/// never retried.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ProcessorError(String);

impl ProcessorError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Processor trait
///
/// Registered by the host, borrowed by the dispatcher while a job runs.
/// A processor receives each assigned job on its own spawned task and must
/// return on its own; there is no cancellation or per-job timeout.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, job: &Job) -> Result<(), ProcessorError>;
}

/// Adapter to use a plain function or closure as a [`Processor`].
pub struct ProcessorFn<F>(pub F);

#[async_trait]
impl<F> Processor for ProcessorFn<F>
where
    F: Fn(&Job) -> Result<(), ProcessorError> + Send + Sync,
{
    async fn process(&self, job: &Job) -> Result<(), ProcessorError> {
        (self.0)(job)
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock processor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always succeed
        Success,
        /// Always fail with message
        Fail(String),
        /// Sleep before succeeding (keeps the processor busy)
        Delay(Duration),
    }

    /// Mock Processor for testing
    pub struct MockProcessor {
        behavior: MockBehavior,
        seen: Arc<Mutex<Vec<Job>>>,
    }

    impl MockProcessor {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }

        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }

        pub fn call_count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        /// Jobs this processor was invoked with, in invocation order.
        pub fn seen_jobs(&self) -> Vec<Job> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Processor for MockProcessor {
        async fn process(&self, job: &Job) -> Result<(), ProcessorError> {
            self.seen.lock().unwrap().push(job.clone());

            match &self.behavior {
                MockBehavior::Success => Ok(()),
                MockBehavior::Fail(msg) => Err(ProcessorError::new(msg.clone())),
                MockBehavior::Delay(d) => {
                    tokio::time::sleep(*d).await;
                    Ok(())
                }
            }
        }
    }
}
