use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::scheduler::job::Job;
use crate::store::{JobStore, StoreError};

/// In-memory store. The default backend and the one tests build on.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Uuid, Job>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn save(&self, record: &Job) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(())
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
        self.records.write().await.remove(&id);
        Ok(())
    }
}
