use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::time::Duration;

use uuid::Uuid;

use crate::scheduler::job::{Algorithm, Job};

/// Ordering view of a pending job, held by the ready container.
///
/// Entries carry only the immutable ordering keys; the job table remains the
/// single record of mutable job state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyEntry {
    pub id: Uuid,
    pub arrival_seq: u64,
    pub priority: i32,
    pub execution_time: Duration,
}

impl ReadyEntry {
    pub fn of(job: &Job) -> Self {
        Self {
            id: job.id,
            arrival_seq: job.arrival_seq,
            priority: job.priority,
            execution_time: job.execution_time,
        }
    }
}

/// Heap wrapper: shortest `execution_time` first, ties by earliest arrival.
#[derive(Debug, Clone)]
pub struct ShortestFirst(pub ReadyEntry);

impl Ord for ShortestFirst {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; comparisons are inverted so the shortest
        // job (earliest arrival on ties) surfaces at the top.
        other
            .0
            .execution_time
            .cmp(&self.0.execution_time)
            .then_with(|| other.0.arrival_seq.cmp(&self.0.arrival_seq))
    }
}

impl PartialOrd for ShortestFirst {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ShortestFirst {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ShortestFirst {}

/// Heap wrapper: highest `priority` first, ties by earliest arrival.
#[derive(Debug, Clone)]
pub struct HighestPriority(pub ReadyEntry);

impl Ord for HighestPriority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .priority
            .cmp(&other.0.priority)
            .then_with(|| other.0.arrival_seq.cmp(&self.0.arrival_seq))
    }
}

impl PartialOrd for HighestPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HighestPriority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HighestPriority {}

/// The ready container for the active scheduling policy.
///
/// One variant per policy, each with the internal representation its ordering
/// calls for: arrival order for FIFO, a circular queue for Round Robin and
/// min/max heaps for SJF and Priority. The set is closed and dispatch matches
/// it exhaustively.
#[derive(Debug)]
pub enum ReadyQueue {
    Fifo(VecDeque<ReadyEntry>),
    RoundRobin(VecDeque<ReadyEntry>),
    Sjf(BinaryHeap<ShortestFirst>),
    Priority(BinaryHeap<HighestPriority>),
}

impl ReadyQueue {
    /// Empty container for the given policy.
    pub fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Fifo => ReadyQueue::Fifo(VecDeque::new()),
            Algorithm::RoundRobin => ReadyQueue::RoundRobin(VecDeque::new()),
            Algorithm::Sjf => ReadyQueue::Sjf(BinaryHeap::new()),
            Algorithm::Priority => ReadyQueue::Priority(BinaryHeap::new()),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            ReadyQueue::Fifo(_) => Algorithm::Fifo,
            ReadyQueue::RoundRobin(_) => Algorithm::RoundRobin,
            ReadyQueue::Sjf(_) => Algorithm::Sjf,
            ReadyQueue::Priority(_) => Algorithm::Priority,
        }
    }

    /// Insert a newly pending job under the policy's ordering.
    pub fn admit(&mut self, entry: ReadyEntry) {
        match self {
            ReadyQueue::Fifo(q) | ReadyQueue::RoundRobin(q) => q.push_back(entry),
            ReadyQueue::Sjf(h) => h.push(ShortestFirst(entry)),
            ReadyQueue::Priority(h) => h.push(HighestPriority(entry)),
        }
    }

    /// Pop the next job in dispatch order.
    pub fn next(&mut self) -> Option<ReadyEntry> {
        match self {
            ReadyQueue::Fifo(q) | ReadyQueue::RoundRobin(q) => q.pop_front(),
            ReadyQueue::Sjf(h) => h.pop().map(|e| e.0),
            ReadyQueue::Priority(h) => h.pop().map(|e| e.0),
        }
    }

    /// Re-enter a preempted job. Round Robin puts it at the tail so every
    /// other ready job gets a turn first; the non-preemptive policies never
    /// requeue, but re-admission keeps the entry ordered if they ever do.
    pub fn requeue(&mut self, entry: ReadyEntry) {
        match self {
            ReadyQueue::RoundRobin(q) => q.push_back(entry),
            other => other.admit(entry),
        }
    }

    /// Remove and return every pending entry. Used when switching policies.
    pub fn drain(&mut self) -> Vec<ReadyEntry> {
        match self {
            ReadyQueue::Fifo(q) | ReadyQueue::RoundRobin(q) => q.drain(..).collect(),
            ReadyQueue::Sjf(h) => h.drain().map(|e| e.0).collect(),
            ReadyQueue::Priority(h) => h.drain().map(|e| e.0).collect(),
        }
    }

    /// Replace the policy, re-admitting every pending entry into the new
    /// container. Ordering keys are preserved; no entry is lost or duplicated.
    pub fn switch(&mut self, algorithm: Algorithm) {
        let entries = self.drain();
        let mut next = ReadyQueue::new(algorithm);
        for entry in entries {
            next.admit(entry);
        }
        *self = next;
    }

    pub fn len(&self) -> usize {
        match self {
            ReadyQueue::Fifo(q) | ReadyQueue::RoundRobin(q) => q.len(),
            ReadyQueue::Sjf(h) => h.len(),
            ReadyQueue::Priority(h) => h.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
