//! Persistence boundary for job records.
//!
//! The engine saves a record at job creation and on every state transition,
//! and it never reads the store to make a scheduling decision: in-memory
//! state is authoritative, the store is eventually consistent with it.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::scheduler::job::Job;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Durable storage collaborator for job records.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn save(&self, record: &Job) -> Result<(), StoreError>;
    async fn load(&self, id: Uuid) -> Result<Option<Job>, StoreError>;
    async fn list_all(&self) -> Result<Vec<Job>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}
