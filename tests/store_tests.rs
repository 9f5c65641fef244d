use std::path::PathBuf;
use std::time::Duration;

use uuid::Uuid;

use taskmill::scheduler::job::{Algorithm, Job, JobSpec, JobStatus};
use taskmill::store::{JobStore, JsonFileStore, MemoryStore};

fn record(name: &str, arrival_seq: u64) -> Job {
    Job::admit(
        JobSpec {
            name: name.to_string(),
            description: Some("stored".to_string()),
            priority: 2,
            execution_time: Duration::from_millis(100),
            algorithm: Algorithm::Priority,
        },
        arrival_seq,
    )
}

fn scratch_file() -> PathBuf {
    std::env::temp_dir().join(format!("taskmill-store-{}.json", Uuid::new_v4()))
}

#[tokio::test]
async fn memory_store_roundtrip() {
    let store = MemoryStore::new();
    let a = record("a", 0);
    let b = record("b", 1);
    let (a_id, b_id) = (a.id, b.id);

    store.save(&a).await.unwrap();
    store.save(&b).await.unwrap();

    let loaded = store.load(a_id).await.unwrap().unwrap();
    assert_eq!(loaded.name, "a");
    assert_eq!(loaded.status, JobStatus::Pending);

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), 2);
    // Admission order.
    assert_eq!(all[0].id, a_id);
    assert_eq!(all[1].id, b_id);

    store.delete(a_id).await.unwrap();
    assert!(store.load(a_id).await.unwrap().is_none());
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn memory_store_save_overwrites() {
    let store = MemoryStore::new();
    let mut job = record("mutating", 0);
    store.save(&job).await.unwrap();

    job.status = JobStatus::Running;
    job.status_seq = 2;
    store.save(&job).await.unwrap();

    let loaded = store.load(job.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, JobStatus::Running);
    assert_eq!(loaded.status_seq, 2);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn json_file_store_survives_reopen() {
    let path = scratch_file();

    let a = record("a", 0);
    let b = record("b", 1);
    let (a_id, b_id) = (a.id, b.id);

    {
        let store = JsonFileStore::open(path.clone()).await.unwrap();
        store.save(&a).await.unwrap();
        store.save(&b).await.unwrap();
    }

    let reopened = JsonFileStore::open(path.clone()).await.unwrap();
    let all = reopened.list_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, a_id);
    assert_eq!(all[1].id, b_id);

    let loaded = reopened.load(b_id).await.unwrap().unwrap();
    assert_eq!(loaded.name, "b");
    assert_eq!(loaded.priority, 2);
    assert_eq!(loaded.execution_time, Duration::from_millis(100));

    reopened.delete(a_id).await.unwrap();
    drop(reopened);

    let after_delete = JsonFileStore::open(path.clone()).await.unwrap();
    assert_eq!(after_delete.list_all().await.unwrap().len(), 1);

    let _ = tokio::fs::remove_file(path).await;
}

#[tokio::test]
async fn json_file_store_starts_empty_without_a_file() {
    let path = scratch_file();
    let store = JsonFileStore::open(path.clone()).await.unwrap();
    assert!(store.list_all().await.unwrap().is_empty());
    assert!(store.load(Uuid::new_v4()).await.unwrap().is_none());
}
