//! Dray - embedded persistent job queue backend.
//!
//! A host process enqueues named jobs carrying opaque byte payloads; a pool
//! of in-process processors registered at runtime consumes them
//! concurrently. All job state lives in an embedded ordered key-value store
//! on local disk, so the queue survives restarts.
//!
//! ```no_run
//! use dray::{Backend, Job, ProcessorError, ProcessorFn};
//! use std::sync::Arc;
//!
//! fn handle(job: &Job) -> Result<(), ProcessorError> {
//!     println!("running job {} ({})", job.id, job.name);
//!     Ok(())
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> dray::Result<()> {
//! let backend = Backend::new("db/dev");
//! backend.start()?;
//!
//! backend.register_processor(Arc::new(ProcessorFn(handle)));
//! backend.enqueue_job("SendEmail", b"to: someone".to_vec())?;
//! # backend.stop()?;
//! # Ok(())
//! # }
//! ```

mod backend;

pub use backend::Backend;

// Re-exports of the public surface
pub use dray_core::application::ProcessorId;
pub use dray_core::domain::{Job, JobStatus};
pub use dray_core::error::{BackendError, Result};
pub use dray_core::port::{JobStore, Processor, ProcessorError, ProcessorFn};
pub use dray_infra_sled::SledQueue;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
