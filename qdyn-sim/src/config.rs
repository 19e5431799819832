//! Simulator configuration

use qdyn_state::DEFAULT_PRECISION;

/// Default bound on while-loop iterations
pub const DEFAULT_MAX_LOOP_ITERATIONS: usize = 1000;

/// Configuration for the dynamic-circuit simulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Initial number of digits per coefficient vector
    ///
    /// The kernel grows and shrinks this as gates are applied; it only needs
    /// to be large enough that the first additions do not overflow.
    ///
    /// Default: 32
    pub precision: usize,

    /// Maximum iterations of any single while loop in one run
    ///
    /// Exceeding it aborts the run with
    /// [`SimulatorError::LoopBoundExceeded`](crate::SimulatorError::LoopBoundExceeded).
    ///
    /// Default: 1000
    pub max_loop_iterations: usize,

    /// Random number generator seed for reproducibility
    ///
    /// If None, uses a random seed. Set to Some(seed) for deterministic results.
    ///
    /// Default: None (random)
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            max_loop_iterations: DEFAULT_MAX_LOOP_ITERATIONS,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration for debugging
    ///
    /// - Deterministic seed
    /// - Tight loop bound, so runaway loops fail fast
    pub fn debug() -> Self {
        Self {
            seed: Some(42),
            max_loop_iterations: 100,
            ..Default::default()
        }
    }

    /// Set the initial digit precision
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Set the while-loop iteration bound
    pub fn with_max_loop_iterations(mut self, limit: usize) -> Self {
        self.max_loop_iterations = limit;
        self
    }

    /// Set the random seed for deterministic execution
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.precision < 2 {
            return Err(format!("precision must be at least 2, got {}", self.precision));
        }

        if self.max_loop_iterations == 0 {
            return Err("max_loop_iterations must be > 0".to_string());
        }

        Ok(())
    }
}
