// Key layout and record encoding for the job keyspace

use dray_core::domain::{Job, JobStatus};
use dray_core::error::{BackendError, Result};

/// Width job IDs are zero-padded to inside keys.
///
/// 20 decimal digits cover the full u64 range, so lexicographic key order
/// equals numeric ID order and a prefix scan always yields the numerically
/// smallest pending job first.
const ID_KEY_WIDTH: usize = 20;

/// Key prefix of a status queue, e.g. `q:pending:`.
pub(crate) fn queue_key_prefix(status: JobStatus) -> String {
    format!("q:{}:", status)
}

/// Full key of a job under a status, e.g. `q:pending:00000000000000000042`.
pub(crate) fn job_key(status: JobStatus, id: u64) -> String {
    format!("q:{}:{:0width$}", status, id, width = ID_KEY_WIDTH)
}

pub(crate) fn encode_job(job: &Job) -> Result<Vec<u8>> {
    bincode::serialize(job).map_err(|e| BackendError::Storage(format!("encode job: {}", e)))
}

pub(crate) fn decode_job(bytes: &[u8]) -> Result<Job> {
    bincode::deserialize(bytes).map_err(|e| BackendError::Storage(format!("decode job: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_key_layout() {
        assert_eq!(queue_key_prefix(JobStatus::Pending), "q:pending:");
        assert_eq!(queue_key_prefix(JobStatus::InProgress), "q:inprogress:");
        assert_eq!(
            job_key(JobStatus::Pending, 1),
            "q:pending:00000000000000000001"
        );
        assert_eq!(
            job_key(JobStatus::Failed, u64::MAX),
            "q:failed:18446744073709551615"
        );
    }

    #[test]
    fn test_key_order_matches_numeric_order() {
        // raw decimal text would sort "10" before "2"; padding keeps byte
        // order aligned with ID order
        let k2 = job_key(JobStatus::Pending, 2);
        let k10 = job_key(JobStatus::Pending, 10);
        assert!(k2.as_bytes() < k10.as_bytes());

        let k999 = job_key(JobStatus::Pending, 999);
        let k1000 = job_key(JobStatus::Pending, 1000);
        assert!(k999.as_bytes() < k1000.as_bytes());
    }

    #[test]
    fn test_round_trip() {
        let job = Job::new(1, "TestJob", vec![0x54, 0x65, 0x73, 0x74]);
        let decoded = decode_job(&encode_job(&job).unwrap()).unwrap();
        assert_eq!(decoded, job);
    }

    #[test]
    fn test_round_trip_empty_fields() {
        let job = Job::new(7, "", vec![]);
        let decoded = decode_job(&encode_job(&job).unwrap()).unwrap();
        assert_eq!(decoded, job);
    }

    #[test]
    fn test_round_trip_arbitrary_binary_data() {
        let data: Vec<u8> = (0..=255).cycle().take(64 * 1024).collect();
        let job = Job::new(u64::MAX, "BinaryJob", data);
        let decoded = decode_job(&encode_job(&job).unwrap()).unwrap();
        assert_eq!(decoded, job);
    }

    #[test]
    fn test_decode_garbage_is_storage_error() {
        let err = decode_job(&[0xff, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, BackendError::Storage(_)));
    }
}
