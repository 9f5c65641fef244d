use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::scheduler::job::Algorithm;

/// Configuration for the scheduling engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of concurrent worker slots.
    pub workers: usize,
    /// Round Robin time quantum. One global value, not per-job.
    pub quantum: Duration,
    /// How often the dispatcher checks for free slots and ready jobs.
    pub dispatch_interval: Duration,
    /// Upper bound on jobs held in the table.
    pub max_jobs: usize,
    /// Policy active at startup.
    pub algorithm: Algorithm,
    /// Whether the dispatcher admits work before an explicit `start`.
    pub start_running: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            quantum: Duration::from_secs(10),
            dispatch_interval: Duration::from_millis(100),
            max_jobs: 10_000,
            algorithm: Algorithm::Fifo,
            start_running: true,
        }
    }
}

impl EngineConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_quantum(mut self, quantum: Duration) -> Self {
        self.quantum = quantum;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn stopped(mut self) -> Self {
        self.start_running = false;
        self
    }
}

/// Configuration for the HTTP server process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Persist job records to this JSON file; in-memory only when unset.
    pub state_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // SAFETY: This is a hardcoded valid address that will always parse
            listen_addr: "127.0.0.1:8080"
                .parse()
                .expect("default listen address is valid"),
            state_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_config_default() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.workers, 3);
        assert_eq!(cfg.quantum, Duration::from_secs(10));
        assert_eq!(cfg.dispatch_interval, Duration::from_millis(100));
        assert_eq!(cfg.max_jobs, 10_000);
        assert_eq!(cfg.algorithm, Algorithm::Fifo);
        assert!(cfg.start_running);
    }

    #[test]
    fn engine_config_builders() {
        let cfg = EngineConfig::default()
            .with_workers(1)
            .with_quantum(Duration::from_millis(10))
            .with_algorithm(Algorithm::RoundRobin)
            .stopped();
        assert_eq!(cfg.workers, 1);
        assert_eq!(cfg.quantum, Duration::from_millis(10));
        assert_eq!(cfg.algorithm, Algorithm::RoundRobin);
        assert!(!cfg.start_running);
    }

    #[test]
    fn server_config_default() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.listen_addr.to_string(), "127.0.0.1:8080");
        assert!(cfg.state_file.is_none());
    }
}
