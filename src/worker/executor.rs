use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

/// One slice of work handed to the pool: the job's whole remaining time under
/// the non-preemptive policies, at most one quantum under Round Robin.
#[derive(Debug, Clone)]
pub struct SliceRequest {
    pub job_id: Uuid,
    pub name: String,
    pub duration: Duration,
}

/// What a worker reports back when its slice ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceOutcome {
    /// The slice ran to its boundary and `consumed` work is no longer owed.
    Ran { consumed: Duration },
    /// The run raised an error. The failure is isolated to this job.
    Failed { error: String },
}

/// The seam between the dispatcher and whatever performs the work.
///
/// The engine owns scheduling; an executor owns a single slice from start to
/// checkpoint. Tests inject failing executors through this trait to exercise
/// error isolation.
#[async_trait]
pub trait SliceExecutor: Send + Sync {
    async fn run(&self, request: SliceRequest) -> SliceOutcome;
}

/// Performs simulated work by holding the slot for the slice duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedExecutor;

#[async_trait]
impl SliceExecutor for SimulatedExecutor {
    async fn run(&self, request: SliceRequest) -> SliceOutcome {
        tracing::debug!(
            job_id = %request.job_id,
            name = %request.name,
            slice_ms = request.duration.as_millis() as u64,
            "Running slice"
        );
        tokio::time::sleep(request.duration).await;
        SliceOutcome::Ran {
            consumed: request.duration,
        }
    }
}
