// Backend lifecycle and enqueue tests

use dray::{Backend, BackendError, JobStatus};

#[tokio::test]
async fn test_start_requires_db_path() {
    let backend = Backend::new("");
    let err = backend.start().unwrap_err();
    assert!(matches!(err, BackendError::Config(_)));
}

#[tokio::test]
async fn test_enqueue_job_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Backend::new(dir.path());
    backend.start().unwrap();

    let id = backend
        .enqueue_job("TestJob", vec![0x54, 0x65, 0x73, 0x74])
        .unwrap();
    assert_eq!(id, 1);

    let job = backend.job(JobStatus::Pending, id).unwrap().unwrap();
    assert_eq!(job.id, id);
    assert_eq!(job.name, "TestJob");
    assert_eq!(job.data, vec![0x54, 0x65, 0x73, 0x74]);

    backend.stop().unwrap();
}

#[tokio::test]
async fn test_enqueue_job_concurrent_ids_are_unique() {
    let dir = tempfile::tempdir().unwrap();
    let backend = std::sync::Arc::new(Backend::new(dir.path()));
    backend.start().unwrap();

    let b1 = backend.clone();
    let h1 = tokio::spawn(async move { b1.enqueue_job("TestJob", vec![]).unwrap() });
    let b2 = backend.clone();
    let h2 = tokio::spawn(async move { b2.enqueue_job("TestJob", vec![]).unwrap() });

    let id1 = h1.await.unwrap();
    let id2 = h2.await.unwrap();

    let mut ids = vec![id1, id2];
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);

    backend.stop().unwrap();
}

#[tokio::test]
async fn test_double_stop_fails() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Backend::new(dir.path());
    backend.start().unwrap();

    backend.stop().unwrap();
    let err = backend.stop().unwrap_err();
    assert!(matches!(err, BackendError::Storage(_)));
}

#[tokio::test]
async fn test_stop_releases_store_for_next_owner() {
    let dir = tempfile::tempdir().unwrap();

    let backend = Backend::new(dir.path());
    backend.start().unwrap();
    backend.enqueue_job("TestJob", vec![]).unwrap();
    backend.stop().unwrap();

    // the data directory lock must be gone, or this open fails
    let backend = Backend::new(dir.path());
    backend.start().unwrap();
    assert_eq!(backend.count(JobStatus::Pending).unwrap(), 1);
    backend.stop().unwrap();
}

#[tokio::test]
async fn test_stop_with_pending_backlog_leaves_no_residue() {
    let dir = tempfile::tempdir().unwrap();

    let backend = Backend::new(dir.path());
    backend.start().unwrap();
    for _ in 0..300 {
        backend.enqueue_job("TestJob", vec![]).unwrap();
    }
    // no processor ever registered; nothing may be in flight
    assert_eq!(backend.count(JobStatus::InProgress).unwrap(), 0);
    backend.stop().unwrap();

    let backend = Backend::new(dir.path());
    backend.start().unwrap();
    assert_eq!(backend.count(JobStatus::Pending).unwrap(), 300);
    assert_eq!(backend.count(JobStatus::InProgress).unwrap(), 0);
    backend.stop().unwrap();
}
