use thiserror::Error;
use uuid::Uuid;

use crate::scheduler::job::JobStatus;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("invalid job spec: {0}")]
    Validation(String),

    #[error("job not found: {0}")]
    NotFound(Uuid),

    #[error("job {id} is already terminal ({status})")]
    AlreadyTerminal { id: Uuid, status: JobStatus },

    #[error("illegal status transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("job execution failed: {0}")]
    ExecutionFailure(String),

    #[error("persistence write failed: {0}")]
    PersistenceWrite(String),

    #[error("job {0} is running; cancel it first")]
    JobRunning(Uuid),

    #[error("job table at capacity")]
    QueueFull,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
