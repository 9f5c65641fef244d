pub mod engine;
pub mod job;
pub mod strategy;
pub mod table;
pub mod tracker;

pub use engine::{SchedulerEngine, SchedulerStatus};
pub use job::{Algorithm, Job, JobSpec, JobStatus};
pub use strategy::{ReadyEntry, ReadyQueue};
pub use table::{JobTable, StatusCounts};
pub use tracker::StatusTracker;
