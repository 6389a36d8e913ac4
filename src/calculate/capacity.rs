//! Capacity formulas
//!
//! Sizing of agent check-in workloads against a pool of catalog compilation
//! workers. Intervals and compile times are in seconds.
//!
//! Both pool formulas are forms of Little's Law (`L = λW`): the number of
//! busy workers equals the check-in arrival rate times the time spent
//! compiling each catalog.

use serde::{Deserialize, Serialize};

/// Seconds in one day
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Upper bound on the number of agent runs worth sampling
pub const MAXIMUM_RUN_SAMPLE: u64 = 10_000;

/// Multiple of the busy workers to provision when sizing for a node count
pub const WORKER_HEADROOM_FACTOR: u64 = 2;

/// Number of agent runs to sample to observe a representative compile time.
///
/// A run interval of zero means the interval is unknown, so every node is
/// sampled once.
pub fn calculate_run_sample(active_nodes: u64, run_interval: u64) -> u64 {
    if run_interval == 0 {
        return active_nodes;
    }
    let runs_per_day = (SECONDS_PER_DAY / run_interval).max(1);
    active_nodes
        .saturating_mul(runs_per_day)
        .min(MAXIMUM_RUN_SAMPLE)
        .max(active_nodes)
}

/// Theoretical maximum number of nodes a pool of workers can serve when every
/// worker is busy for the whole run interval.
pub fn calculate_maximum_nodes(average_compile_time: u64, available_workers: u64, run_interval: u64) -> u64 {
    available_workers.saturating_mul(run_interval) / average_compile_time.max(1)
}

/// Minimum number of workers to serve `active_nodes`, keeping the pool at
/// most half busy.
pub fn calculate_minimum_workers(active_nodes: u64, average_compile_time: u64, run_interval: u64) -> u64 {
    let busy_seconds = active_nodes
        .saturating_mul(average_compile_time)
        .saturating_mul(WORKER_HEADROOM_FACTOR);
    busy_seconds.div_ceil(run_interval.max(1))
}

/// Agent workload used to estimate the capacity of a host's worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentWorkload {
    /// Agent run interval in seconds
    pub run_interval: u64,
    /// Average catalog compile time in seconds
    pub average_compile_time: u64,
    /// Number of active agents, when known
    pub active_nodes: Option<u64>,
}

impl Default for AgentWorkload {
    fn default() -> Self {
        Self {
            run_interval: 1800,
            average_compile_time: 20,
            active_nodes: None,
        }
    }
}

/// Capacity of one host's worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityEstimate {
    /// Workers recommended for the host
    pub workers: u64,
    /// Nodes those workers can serve
    pub maximum_nodes: u64,
    /// Workers needed for the active node count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_workers: Option<u64>,
    /// Agent runs to sample when measuring compile times
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_sample: Option<u64>,
}

impl CapacityEstimate {
    /// Estimate the capacity of `workers` under `workload`
    pub fn for_workers(workers: u64, workload: &AgentWorkload) -> Self {
        Self {
            workers,
            maximum_nodes: calculate_maximum_nodes(
                workload.average_compile_time,
                workers,
                workload.run_interval,
            ),
            minimum_workers: workload.active_nodes.map(|nodes| {
                calculate_minimum_workers(nodes, workload.average_compile_time, workload.run_interval)
            }),
            run_sample: workload
                .active_nodes
                .map(|nodes| calculate_run_sample(nodes, workload.run_interval)),
        }
    }

    /// True when the active node count needs more workers than recommended
    pub fn is_undersized(&self) -> bool {
        self.minimum_workers.is_some_and(|needed| needed > self.workers)
    }
}
