// Dray Infrastructure - Sled Adapter
// Implements: JobStore over an embedded ordered keyspace

mod codec;
mod queue;
mod sequence;

pub use queue::SledQueue;

// Note: sled::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sled::Error> for
// BackendError here).
