//! Execution statistics tracking

use std::time::Duration;

/// Execution statistics for one simulation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionStatistics {
    /// Total execution time
    pub total_time: Duration,

    /// Unitary gates and resets applied to the kernel
    pub gates_applied: usize,

    /// Measurements that collapsed the state
    pub mid_measurements: usize,

    /// Read-out measurements sampled without collapse
    pub final_measurements: usize,

    /// While-loop bodies executed, summed over all loops
    pub loop_iterations: usize,

    /// Branch blocks dispatched
    pub branches_taken: usize,

    /// Decision-diagram nodes reachable from the final state
    pub final_node_count: usize,
}

impl ExecutionStatistics {
    /// Create a new statistics object
    pub fn new() -> Self {
        Self::default()
    }

    /// All measurements, mid-circuit and final
    pub fn measurements(&self) -> usize {
        self.mid_measurements + self.final_measurements
    }

    /// Get the gate execution rate (gates per second)
    pub fn gates_per_second(&self) -> f64 {
        let secs = self.total_time.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.gates_applied as f64 / secs
        }
    }

    /// Accumulate the counters of another run
    pub fn merge(&mut self, other: &ExecutionStatistics) {
        self.total_time += other.total_time;
        self.gates_applied += other.gates_applied;
        self.mid_measurements += other.mid_measurements;
        self.final_measurements += other.final_measurements;
        self.loop_iterations += other.loop_iterations;
        self.branches_taken += other.branches_taken;
        self.final_node_count = self.final_node_count.max(other.final_node_count);
    }
}

impl std::fmt::Display for ExecutionStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Execution Statistics:")?;
        writeln!(f, "  Total time: {:?}", self.total_time)?;
        writeln!(f, "  Gates applied: {}", self.gates_applied)?;
        writeln!(f, "    Execution rate: {:.0} gates/sec", self.gates_per_second())?;

        writeln!(f, "\n  Measurements:")?;
        writeln!(f, "    Mid-circuit: {}", self.mid_measurements)?;
        writeln!(f, "    Final: {}", self.final_measurements)?;

        writeln!(f, "\n  Control flow:")?;
        writeln!(f, "    Loop iterations: {}", self.loop_iterations)?;
        writeln!(f, "    Branches taken: {}", self.branches_taken)?;

        writeln!(f, "\n  State:")?;
        writeln!(f, "    Decision-diagram nodes: {}", self.final_node_count)?;

        Ok(())
    }
}
