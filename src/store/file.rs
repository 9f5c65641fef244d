use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::scheduler::job::Job;
use crate::store::{JobStore, StoreError};

/// JSON-file-backed store.
///
/// Keeps the full record set in memory and rewrites the file as a whole on
/// every mutation. Good enough for the record volumes a single engine
/// produces; the engine never waits on these writes.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: RwLock<HashMap<Uuid, Job>>,
}

impl JsonFileStore {
    /// Open the store, loading any records a previous run left behind.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let jobs: Vec<Job> = serde_json::from_slice(&bytes)?;
                jobs.into_iter().map(|j| (j.id, j)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(path = %path.display(), records = records.len(), "Opened job store");
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    async fn flush(&self, records: &HashMap<Uuid, Job>) -> Result<(), StoreError> {
        let mut jobs: Vec<&Job> = records.values().collect();
        jobs.sort_by_key(|j| j.arrival_seq);
        let bytes = serde_json::to_vec_pretty(&jobs)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for JsonFileStore {
    async fn save(&self, record: &Job) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.insert(record.id, record.clone());
        self.flush(&records).await
    }

    async fn load(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Job>, StoreError> {
        let records = self.records.read().await;
        let mut all: Vec<Job> = records.values().cloned().collect();
        all.sort_by_key(|j| j.arrival_seq);
        Ok(all)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.remove(&id);
        self.flush(&records).await
    }
}
