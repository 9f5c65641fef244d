//! Worker-side execution of job slices.
//!
//! The dispatcher hands a [`SliceRequest`](executor::SliceRequest) to the
//! pool; an executor performs the work and reports a
//! [`SliceOutcome`](executor::SliceOutcome) at the checkpoint (quantum
//! boundary for Round Robin, job completion otherwise). Failures are
//! isolated: a failed slice fails its one job and frees the slot.

pub mod executor;

pub use executor::{SimulatedExecutor, SliceExecutor, SliceOutcome, SliceRequest};
