// Job Domain Model

use serde::{Deserialize, Serialize};

/// Durable unit of work.
///
/// A job is immutable after creation; only its location in the queue
/// (its [`JobStatus`]) changes over its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier, assigned in strictly increasing order and never
    /// reused, even across process restarts.
    pub id: u64,
    /// Routing name chosen by the host. Opaque to the queue itself.
    pub name: String,
    /// Opaque payload bytes. May be empty.
    pub data: Vec<u8>,
}

impl Job {
    pub fn new(id: u64, name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id,
            name: name.into(),
            data,
        }
    }
}

/// Location of a job within the queue.
///
/// A job occupies exactly one status at any moment. The lowercase textual
/// form is part of the on-disk key layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting to be processed
    Pending,
    /// Processing in progress
    InProgress,
    /// Processing complete
    Complete,
    /// Processing errored out
    Failed,
}

impl JobStatus {
    /// Lowercase token used in the key layout.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "inprogress",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
        }
    }

    /// Terminal statuses admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_textual_form() {
        assert_eq!(JobStatus::Pending.to_string(), "pending");
        assert_eq!(JobStatus::InProgress.to_string(), "inprogress");
        assert_eq!(JobStatus::Complete.to_string(), "complete");
        assert_eq!(JobStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
        assert!(JobStatus::Complete.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }
}
