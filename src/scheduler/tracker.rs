use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::error::{Result, SchedulerError};
use crate::scheduler::job::{Job, JobStatus};
use crate::store::JobStore;

const SAVE_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);

/// The sole writer of job status.
///
/// Every transition is validated against the state machine, stamped with a
/// per-job monotonically increasing sequence number, and forwarded to the
/// persistence collaborator. Store writes are fire-and-forget with bounded
/// retries; a write that keeps failing is logged as a divergence warning and
/// never blocks or rolls back the in-memory transition.
pub struct StatusTracker {
    store: Arc<dyn JobStore>,
}

impl StatusTracker {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Record a newly admitted job in its initial `Pending` state.
    pub fn record_admission(&self, job: &mut Job) {
        job.status_seq = 1;
        tracing::info!(
            job_id = %job.id,
            name = %job.name,
            algorithm = %job.algorithm,
            arrival_seq = job.arrival_seq,
            "Job admitted"
        );
        self.persist(job.clone());
    }

    /// Apply and record a state transition.
    ///
    /// Terminal states are final: an attempted transition out of one returns
    /// `AlreadyTerminal`; any other disallowed edge returns
    /// `InvalidTransition`. On success the job's sequence number is bumped
    /// and the new record is forwarded to the store.
    pub fn transition(&self, job: &mut Job, to: JobStatus) -> Result<u64> {
        let from = job.status;
        if from.is_terminal() {
            return Err(SchedulerError::AlreadyTerminal {
                id: job.id,
                status: from,
            });
        }
        if !from.permits(to) {
            return Err(SchedulerError::InvalidTransition { from, to });
        }

        job.status = to;
        job.status_seq += 1;
        match to {
            JobStatus::Running => {
                if job.started_at.is_none() {
                    job.started_at = Some(Utc::now());
                }
            }
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => {
                job.completed_at = Some(Utc::now());
            }
            JobStatus::Pending => {}
        }

        tracing::debug!(
            job_id = %job.id,
            from = %from,
            to = %to,
            seq = job.status_seq,
            "Status transition"
        );
        self.persist(job.clone());
        Ok(job.status_seq)
    }

    fn persist(&self, record: Job) {
        let store = self.store.clone();
        tokio::spawn(async move {
            save_with_retry(store, record).await;
        });
    }
}

async fn save_with_retry(store: Arc<dyn JobStore>, record: Job) {
    let mut backoff = INITIAL_BACKOFF;
    for attempt in 1..=SAVE_ATTEMPTS {
        match store.save(&record).await {
            Ok(()) => return,
            Err(e) if attempt < SAVE_ATTEMPTS => {
                tracing::debug!(
                    job_id = %record.id,
                    attempt,
                    error = %e,
                    "Store write failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) => {
                tracing::warn!(
                    job_id = %record.id,
                    seq = record.status_seq,
                    error = %e,
                    "Store write failed after retries; in-memory state is ahead of the store"
                );
            }
        }
    }
}
