use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SchedulerError};

/// Lifecycle states of a job.
///
/// `Completed`, `Failed` and `Cancelled` are terminal; no transition out of
/// them is ever permitted. Round Robin additionally cycles `Running` back to
/// `Pending` on preemption until the job's remaining time reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Whether the state machine allows `self -> to`.
    pub fn permits(self, to: JobStatus) -> bool {
        matches!(
            (self, to),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Pending, JobStatus::Cancelled)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Cancelled)
                | (JobStatus::Running, JobStatus::Pending)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Scheduling policy tag. The set is closed; dispatch matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Fifo,
    RoundRobin,
    Sjf,
    Priority,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Fifo => write!(f, "fifo"),
            Algorithm::RoundRobin => write!(f, "round_robin"),
            Algorithm::Sjf => write!(f, "sjf"),
            Algorithm::Priority => write!(f, "priority"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "fifo" => Ok(Algorithm::Fifo),
            "round_robin" => Ok(Algorithm::RoundRobin),
            "sjf" => Ok(Algorithm::Sjf),
            "priority" => Ok(Algorithm::Priority),
            other => Err(format!(
                "unknown algorithm '{}' (expected fifo, round_robin, sjf or priority)",
                other
            )),
        }
    }
}

/// What a caller provides to create a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(with = "duration_ms", rename = "execution_time_ms")]
    pub execution_time: Duration,
    pub algorithm: Algorithm,
}

impl JobSpec {
    /// Reject malformed specs before they enter the system.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SchedulerError::Validation("job name is empty".to_string()));
        }
        if self.execution_time.is_zero() {
            return Err(SchedulerError::Validation(
                "execution_time must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Higher value = more urgent. Only the Priority policy reads this.
    pub priority: i32,
    #[serde(with = "duration_ms", rename = "execution_time_ms")]
    pub execution_time: Duration,
    #[serde(with = "duration_ms", rename = "remaining_time_ms")]
    pub remaining_time: Duration,
    /// Admission counter assigned under the scheduler lock. Strictly ordered
    /// across all submissions; the FIFO key and the SJF/Priority tie-break.
    pub arrival_seq: u64,
    pub algorithm: Algorithm,
    pub status: JobStatus,
    /// Bumped on every recorded transition. Per-job monotonic.
    pub status_seq: u64,
    /// Advisory flag, observed at the next checkpoint.
    #[serde(skip)]
    pub cancel_requested: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl Job {
    /// Build a `Pending` job from a validated spec. The caller supplies the
    /// arrival sequence; it must be assigned under the scheduler lock.
    pub fn admit(spec: JobSpec, arrival_seq: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: spec.name,
            description: spec.description,
            priority: spec.priority,
            execution_time: spec.execution_time,
            remaining_time: spec.execution_time,
            arrival_seq,
            algorithm: spec.algorithm,
            status: JobStatus::Pending,
            status_seq: 0,
            cancel_requested: false,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
        }
    }
}

/// Durations travel as integer milliseconds on the wire and in stored records.
pub mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}
