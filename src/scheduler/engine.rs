use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{Result, SchedulerError};
use crate::scheduler::job::{Algorithm, Job, JobSpec, JobStatus};
use crate::scheduler::strategy::{ReadyEntry, ReadyQueue};
use crate::scheduler::table::{JobTable, StatusCounts};
use crate::scheduler::tracker::StatusTracker;
use crate::store::JobStore;
use crate::worker::executor::{SimulatedExecutor, SliceExecutor, SliceOutcome, SliceRequest};

/// Snapshot returned by the status operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub algorithm: Algorithm,
    pub workers: usize,
    pub counts: StatusCounts,
}

/// Shared mutable scheduling state: the job table, the ready container and
/// the admission counter. Guarded by one lock, held only around container
/// mutation and never across job work.
struct SchedState {
    table: JobTable,
    ready: ReadyQueue,
    next_arrival: u64,
    running: bool,
}

/// The scheduling engine.
///
/// Owns the active policy, the ready container and the dispatch loop, and
/// exposes the submit/cancel/switch/start/stop/status operations. Cloning
/// yields another handle to the same engine; independent engines can coexist
/// (nothing here is global).
#[derive(Clone)]
pub struct SchedulerEngine {
    state: Arc<RwLock<SchedState>>,
    tracker: Arc<StatusTracker>,
    slots: Arc<Semaphore>,
    executor: Arc<dyn SliceExecutor>,
    config: EngineConfig,
    shutdown: CancellationToken,
    dispatcher_spawned: Arc<AtomicBool>,
}

impl SchedulerEngine {
    pub fn new(config: EngineConfig, store: Arc<dyn JobStore>) -> Self {
        Self::with_executor(config, store, Arc::new(SimulatedExecutor))
    }

    /// Build an engine with a custom slice executor. Tests use this seam to
    /// inject recording or failing executors.
    pub fn with_executor(
        config: EngineConfig,
        store: Arc<dyn JobStore>,
        executor: Arc<dyn SliceExecutor>,
    ) -> Self {
        let state = SchedState {
            table: JobTable::with_capacity(config.max_jobs),
            ready: ReadyQueue::new(config.algorithm),
            next_arrival: 0,
            running: config.start_running,
        };
        Self {
            state: Arc::new(RwLock::new(state)),
            tracker: Arc::new(StatusTracker::new(store)),
            slots: Arc::new(Semaphore::new(config.workers)),
            executor,
            config,
            shutdown: CancellationToken::new(),
            dispatcher_spawned: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawn the dispatch loop. There is exactly one dispatcher per engine;
    /// a second call is a programming error and is rejected.
    pub fn spawn_dispatcher(&self) -> Result<JoinHandle<()>> {
        if self.dispatcher_spawned.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::Internal(
                "dispatcher already spawned for this engine".to_string(),
            ));
        }
        let engine = self.clone();
        Ok(tokio::spawn(async move {
            engine.dispatch_loop().await;
        }))
    }

    /// Cancel the engine's shutdown token: the dispatcher exits after its
    /// current pass and in-flight slices run to their checkpoint.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Validate a job spec, assign its id and arrival order, record the
    /// `Pending` transition and admit it under the active policy.
    pub async fn submit(&self, spec: JobSpec) -> Result<Uuid> {
        spec.validate()?;

        let mut guard = self.state.write().await;
        let st = &mut *guard;
        if st.table.is_full() {
            return Err(SchedulerError::QueueFull);
        }

        let arrival_seq = st.next_arrival;
        st.next_arrival += 1;

        let mut job = Job::admit(spec, arrival_seq);
        let id = job.id;
        self.tracker.record_admission(&mut job);
        let entry = ReadyEntry::of(&job);
        if !st.table.insert(job) {
            return Err(SchedulerError::QueueFull);
        }
        st.ready.admit(entry);
        Ok(id)
    }

    /// Request cancellation of a job.
    ///
    /// A pending job is cancelled on the spot; a running job keeps its slot
    /// until the next checkpoint (cooperative, never a mid-slice kill).
    /// Returns the job's status as of this call.
    pub async fn cancel(&self, id: Uuid) -> Result<JobStatus> {
        let mut guard = self.state.write().await;
        let st = &mut *guard;
        let job = st
            .table
            .get_mut(&id)
            .ok_or(SchedulerError::NotFound(id))?;

        match job.status {
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => {
                Err(SchedulerError::AlreadyTerminal {
                    id,
                    status: job.status,
                })
            }
            JobStatus::Pending => {
                // The stale ready entry is dropped when the dispatcher pops it.
                self.tracker.transition(job, JobStatus::Cancelled)?;
                Ok(JobStatus::Cancelled)
            }
            JobStatus::Running => {
                job.cancel_requested = true;
                tracing::info!(
                    job_id = %id,
                    "Cancellation requested; will be honored at the next checkpoint"
                );
                Ok(JobStatus::Running)
            }
        }
    }

    /// Atomically replace the active policy. Every pending job is re-admitted
    /// into the new container with its ordering keys and remaining time
    /// intact; running jobs are unaffected.
    pub async fn switch_algorithm(&self, algorithm: Algorithm) {
        let mut st = self.state.write().await;
        let from = st.ready.algorithm();
        if from == algorithm {
            return;
        }
        st.ready.switch(algorithm);
        tracing::info!(
            from = %from,
            to = %algorithm,
            pending = st.ready.len(),
            "Scheduling policy switched"
        );
    }

    /// Resume dispatching.
    pub async fn start(&self) {
        let mut st = self.state.write().await;
        if st.running {
            tracing::warn!("Scheduler is already running");
            return;
        }
        st.running = true;
        tracing::info!("Scheduler started");
    }

    /// Stop dispatching. In-flight slices finish their quantum or run; no new
    /// dispatches are admitted until `start`.
    pub async fn stop(&self) {
        let mut st = self.state.write().await;
        if !st.running {
            tracing::warn!("Scheduler is already stopped");
            return;
        }
        st.running = false;
        tracing::info!("Scheduler stopped; in-flight slices will finish");
    }

    pub async fn status(&self) -> SchedulerStatus {
        let st = self.state.read().await;
        SchedulerStatus {
            running: st.running,
            algorithm: st.ready.algorithm(),
            workers: self.config.workers,
            counts: st.table.counts(),
        }
    }

    pub async fn job(&self, id: Uuid) -> Result<Job> {
        let st = self.state.read().await;
        st.table
            .get(&id)
            .cloned()
            .ok_or(SchedulerError::NotFound(id))
    }

    /// All jobs in admission order.
    pub async fn jobs(&self) -> Vec<Job> {
        let st = self.state.read().await;
        st.table.all_jobs().into_iter().cloned().collect()
    }

    pub async fn jobs_with_status(&self, status: JobStatus) -> Vec<Job> {
        let st = self.state.read().await;
        st.table
            .jobs_with_status(status)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Remove a job record. Running jobs must be cancelled first; their slot
    /// owns them until the checkpoint.
    pub async fn remove_job(&self, id: Uuid) -> Result<Job> {
        let mut guard = self.state.write().await;
        let st = &mut *guard;
        let status = st
            .table
            .get(&id)
            .map(|j| j.status)
            .ok_or(SchedulerError::NotFound(id))?;
        if status == JobStatus::Running {
            return Err(SchedulerError::JobRunning(id));
        }
        // A pending job's ready entry goes stale and is dropped at dispatch.
        st.table
            .remove(&id)
            .ok_or_else(|| SchedulerError::Internal("job vanished during removal".to_string()))
    }

    /// Drop terminal records from the table. Returns the count removed.
    pub async fn clear_finished(&self) -> usize {
        let mut st = self.state.write().await;
        st.table.clear_finished()
    }

    /// The dispatch loop: one serialized task that moves ready jobs onto free
    /// worker slots. Runs until the engine is shut down.
    async fn dispatch_loop(self) {
        let mut tick = tokio::time::interval(self.config.dispatch_interval);
        tracing::info!(
            workers = self.config.workers,
            interval_ms = self.config.dispatch_interval.as_millis() as u64,
            "Dispatcher running"
        );
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Dispatcher shutting down");
                    break;
                }
                _ = tick.tick() => {
                    self.dispatch_ready().await;
                }
            }
        }
    }

    /// Fill free worker slots from the ready container until either runs out.
    async fn dispatch_ready(&self) {
        loop {
            let permit = match self.slots.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => return, // every slot busy
            };

            let Some(request) = self.claim_next().await else {
                return;
            };

            let engine = self.clone();
            tokio::spawn(async move {
                let job_id = request.job_id;
                let outcome = engine.executor.run(request).await;
                engine.finish_slice(job_id, outcome).await;
                drop(permit);
            });
        }
    }

    /// Pop ready entries until one refers to a dispatchable job, transition
    /// it to `Running` and build its slice request. Stale entries (jobs
    /// cancelled or removed while queued) are dropped on the way.
    async fn claim_next(&self) -> Option<SliceRequest> {
        let mut guard = self.state.write().await;
        let st = &mut *guard;
        if !st.running {
            return None;
        }
        let preemptive = st.ready.algorithm() == Algorithm::RoundRobin;

        while let Some(entry) = st.ready.next() {
            let Some(job) = st.table.get_mut(&entry.id) else {
                continue;
            };
            if job.status != JobStatus::Pending {
                continue;
            }
            if job.cancel_requested {
                if let Err(e) = self.tracker.transition(job, JobStatus::Cancelled) {
                    tracing::error!(job_id = %entry.id, error = %e, "Failed to cancel queued job");
                }
                continue;
            }

            let slice = if preemptive {
                job.remaining_time.min(self.config.quantum)
            } else {
                job.remaining_time
            };
            if let Err(e) = self.tracker.transition(job, JobStatus::Running) {
                tracing::error!(job_id = %entry.id, error = %e, "Failed to dispatch job");
                continue;
            }
            tracing::info!(
                job_id = %job.id,
                name = %job.name,
                slice_ms = slice.as_millis() as u64,
                "Job dispatched"
            );
            return Some(SliceRequest {
                job_id: job.id,
                name: job.name.clone(),
                duration: slice,
            });
        }
        None
    }

    /// Process a worker's report at the checkpoint. The slot owns the job
    /// until this point; ownership returns to the engine here.
    async fn finish_slice(&self, job_id: Uuid, outcome: SliceOutcome) {
        let mut guard = self.state.write().await;
        let st = &mut *guard;
        let Some(job) = st.table.get_mut(&job_id) else {
            tracing::warn!(job_id = %job_id, "Slice finished for a job no longer in the table");
            return;
        };

        match outcome {
            SliceOutcome::Ran { consumed } => {
                job.remaining_time = job.remaining_time.saturating_sub(consumed);
                if job.remaining_time.is_zero() {
                    job.result = Some(format!("job {} completed", job.name));
                    if let Err(e) = self.tracker.transition(job, JobStatus::Completed) {
                        tracing::error!(job_id = %job_id, error = %e, "Failed to complete job");
                    }
                } else if job.cancel_requested {
                    // Work remains but cancellation was requested; honor it
                    // at this checkpoint.
                    if let Err(e) = self.tracker.transition(job, JobStatus::Cancelled) {
                        tracing::error!(job_id = %job_id, error = %e, "Failed to cancel job");
                    }
                } else {
                    // Preempted at the quantum boundary; back to the tail.
                    match self.tracker.transition(job, JobStatus::Pending) {
                        Ok(_) => {
                            let entry = ReadyEntry::of(job);
                            st.ready.requeue(entry);
                        }
                        Err(e) => {
                            tracing::error!(job_id = %job_id, error = %e, "Failed to requeue job");
                        }
                    }
                }
            }
            SliceOutcome::Failed { error } => {
                tracing::warn!(job_id = %job_id, error = %error, "Job execution failed");
                job.error = Some(error);
                if let Err(e) = self.tracker.transition(job, JobStatus::Failed) {
                    tracing::error!(job_id = %job_id, error = %e, "Failed to mark job failed");
                }
            }
        }
    }
}
