//! Core simulator implementation

use num_complex::Complex64;
use qdyn_core::{build, Block, Program};
use qdyn_state::{CombState, Kernel, SeqState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    config::SimulatorConfig,
    error::{Result, SimulatorError},
    executor::Executor,
    presets::{Presets, RunMode},
    result::{MeasurementCounts, RunResult},
};

/// Exact simulator for dynamic Clifford+T circuits
///
/// Every [`run`](Self::run) starts from a fresh copy of the initial kernel
/// state, so runs are independent. The kernel left behind by the last run
/// can be inspected afterwards.
///
/// # Example
///
/// ```
/// use qdyn_core::{Operand, Program, RegisterLayout, Statement};
/// use qdyn_sim::{Presets, RunMode, Simulator, SimulatorConfig};
///
/// let mut layout = RegisterLayout::new();
/// layout.add_qreg("q", 1).unwrap();
/// layout.add_creg("c", 1).unwrap();
/// let mut program = Program::new(layout);
/// program
///     .push(Statement::gate("h", [Operand::new("q", 0)]))
///     .push(Statement::measure(Operand::new("q", 0), Operand::new("c", 0)))
///     .push(Statement::gate("h", [Operand::new("q", 0)]));
///
/// let mut sim = Simulator::from_program(&program, SimulatorConfig::default()).unwrap();
/// let result = sim
///     .run(RunMode::Preset, Some(Presets::new().with(0, [true])))
///     .unwrap();
/// assert_eq!(result.bit(0), Some(true));
/// assert!((result.path_probability - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct Simulator<K: Kernel + Clone = CombState> {
    blocks: Vec<Block>,
    config: SimulatorConfig,
    initial: K,
    state: K,
    rng: StdRng,
    path_probability: f64,
}

impl Simulator<CombState> {
    /// Create a simulator for `blocks` on a fresh `|0…0⟩` register
    ///
    /// The register width is taken from the blocks; an empty program
    /// simulates zero qubits.
    pub fn new(blocks: Vec<Block>, config: SimulatorConfig) -> Result<Self> {
        config.validate().map_err(SimulatorError::InvalidConfig)?;
        let num_qubits = blocks.first().map_or(0, Block::num_qubits);
        if blocks.is_empty() {
            warn!("simulating an empty program");
        }
        let kernel = CombState::zero_state(num_qubits, config.precision)?;
        Self::with_kernel(blocks, kernel, config)
    }

    /// Build `program` and create a simulator for it
    pub fn from_program(program: &Program, config: SimulatorConfig) -> Result<Self> {
        let blocks = build(program)?;
        let num_qubits = program.layout.num_qubits();
        config.validate().map_err(SimulatorError::InvalidConfig)?;
        let kernel = CombState::zero_state(num_qubits, config.precision)?;
        Self::with_kernel(blocks, kernel, config)
    }

    /// Amplitude of `basis` after the last run, normalized by the path probability
    pub fn state_amplitude(&mut self, basis: u64) -> Result<Complex64> {
        let norm = self.normalization()?;
        Ok(self.state.get_amplitude(basis)? / norm)
    }

    /// Every normalized amplitude after the last run, indexed by basis
    ///
    /// Only available for registers small enough to enumerate.
    pub fn normalized_amplitudes(&mut self) -> Result<Vec<Complex64>> {
        let norm = self.normalization()?;
        let amplitudes = self.state.amplitudes()?;
        Ok(amplitudes.into_iter().map(|a| a / norm).collect())
    }

    fn normalization(&self) -> Result<f64> {
        if self.path_probability <= 0.0 {
            return Err(SimulatorError::ZeroPathProbability(self.path_probability));
        }
        Ok(self.path_probability.sqrt())
    }
}

impl Simulator<SeqState> {
    /// Stored-register amplitude of the sequential kernel after the last run
    pub fn stored_amplitude(&mut self, basis: u64) -> Result<Complex64> {
        Ok(self.state.stored_amplitude(basis)?)
    }
}

impl<K: Kernel + Clone> Simulator<K> {
    /// Drive `blocks` on a caller-prepared kernel
    ///
    /// Each run starts from a clone of `kernel` as given here.
    pub fn with_kernel(blocks: Vec<Block>, kernel: K, config: SimulatorConfig) -> Result<Self> {
        config.validate().map_err(SimulatorError::InvalidConfig)?;
        if let Some(program) = blocks.first().map(Block::num_qubits) {
            if program != kernel.num_qubits() {
                return Err(SimulatorError::QubitCountMismatch {
                    kernel: kernel.num_qubits(),
                    program,
                });
            }
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            blocks,
            config,
            state: kernel.clone(),
            initial: kernel,
            rng,
            path_probability: 1.0,
        })
    }

    /// Get the simulator configuration
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn num_qubits(&self) -> usize {
        self.initial.num_qubits()
    }

    /// Kernel state left by the last run
    pub fn state(&self) -> &K {
        &self.state
    }

    /// Path probability of the last run
    pub fn path_probability(&self) -> f64 {
        self.path_probability
    }

    /// Execute the program once
    ///
    /// In [`RunMode::Preset`] every mid-circuit measurement takes its outcome
    /// from `presets` and fails if none is left; final measurements use a
    /// preset when one is queued and sample otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A mid-circuit measurement happens on a path of probability zero
    /// - A preset queue runs dry for a mid-circuit measurement
    /// - A loop exceeds `max_loop_iterations`
    /// - The kernel rejects an operation
    pub fn run(&mut self, mode: RunMode, presets: Option<Presets>) -> Result<RunResult> {
        let start = Instant::now();
        debug!(?mode, qubits = self.num_qubits(), "run started");

        self.state = self.initial.clone();
        self.path_probability = 1.0;

        let mut executor = Executor::new(
            &mut self.state,
            &mut self.rng,
            mode,
            presets.unwrap_or_default(),
            self.config.max_loop_iterations,
        );
        let outcome = executor.execute_blocks(&self.blocks);
        let (clbits, path_probability, mut statistics) = executor.finish();
        if let Err(err) = outcome {
            warn!(error = %err, "run failed");
            return Err(err);
        }

        self.path_probability = path_probability;
        statistics.total_time = start.elapsed();
        statistics.final_node_count = self.state.node_count();
        debug!(
            path_probability,
            mid_measurements = statistics.mid_measurements,
            loop_iterations = statistics.loop_iterations,
            "run finished"
        );

        Ok(RunResult {
            clbits,
            path_probability,
            statistics,
        })
    }

    /// Run `shots` independent sample-mode runs and tally the classical registers
    ///
    /// Bitstrings cover classical bits `0..=max written`, highest first.
    pub fn sample(&mut self, shots: usize) -> Result<MeasurementCounts> {
        let mut results = Vec::with_capacity(shots);
        for _ in 0..shots {
            results.push(self.run(RunMode::Sample, None)?);
        }

        let width = results
            .iter()
            .filter_map(|r| r.clbits.keys().next_back())
            .max()
            .map_or(0, |&c| c + 1);

        let mut counts = MeasurementCounts::new();
        for result in &results {
            counts.record(result.bitstring(width));
        }
        info!(shots, outcomes = counts.len(), "sampling finished");
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdyn_core::{FlatBlock, GateKind, GateOp};

    fn bell_blocks() -> Vec<Block> {
        let mut blocks = vec![FlatBlock::new(
            vec![
                GateOp::new(GateKind::H, &[0]),
                GateOp::new(GateKind::Cx, &[0, 1]),
                GateOp::measure(0, 0),
                GateOp::measure(1, 1),
            ],
            2,
        )
        .into()];
        qdyn_core::mark_final_measurements(&mut blocks);
        blocks
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimulatorConfig::default().with_precision(1);
        assert!(matches!(
            Simulator::new(bell_blocks(), config),
            Err(SimulatorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_qubit_count_mismatch() {
        let kernel = CombState::zero_state(3, 8).unwrap();
        assert_eq!(
            Simulator::with_kernel(bell_blocks(), kernel, SimulatorConfig::default()).err(),
            Some(SimulatorError::QubitCountMismatch {
                kernel: 3,
                program: 2
            })
        );
    }

    #[test]
    fn test_final_measurements_do_not_collapse() {
        let mut sim = Simulator::new(bell_blocks(), SimulatorConfig::debug()).unwrap();
        let result = sim.run(RunMode::Sample, None).unwrap();
        assert_eq!(result.path_probability, 1.0);
        assert_eq!(result.statistics.final_measurements, 2);
        assert_eq!(result.statistics.mid_measurements, 0);

        // final read-out does not collapse
        let amp = sim.state_amplitude(0b11).unwrap();
        assert!((amp.norm_sqr() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_runs_are_independent() {
        let mut sim = Simulator::new(bell_blocks(), SimulatorConfig::debug()).unwrap();
        let first = sim.run(RunMode::Sample, None).unwrap();
        let second = sim.run(RunMode::Sample, None).unwrap();
        assert_eq!(first.statistics.gates_applied, second.statistics.gates_applied);
        assert!((sim.state_amplitude(0).unwrap().norm_sqr() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_program() {
        let mut sim = Simulator::new(Vec::new(), SimulatorConfig::default()).unwrap();
        let result = sim.run(RunMode::Sample, None).unwrap();
        assert!(result.clbits.is_empty());
        assert_eq!(result.path_probability, 1.0);
    }
}
