//! Block-tree interpreter

use qdyn_core::{Block, BranchBlock, BuildError, FlatBlock, GateKind, GateOp, LoopBlock, Selector};
use qdyn_state::Kernel;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

use crate::error::{Result, SimulatorError};
use crate::presets::{Presets, RunMode};
use crate::statistics::ExecutionStatistics;

/// What the enclosing loop should do after a block finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Break,
}

/// Mutable state of one run: kernel, classical store and path probability
pub(crate) struct Executor<'a, K, R> {
    kernel: &'a mut K,
    rng: &'a mut R,
    mode: RunMode,
    presets: Presets,
    max_loop_iterations: usize,
    clbits: BTreeMap<usize, bool>,
    path_probability: f64,
    stats: ExecutionStatistics,
}

impl<'a, K: Kernel, R: Rng> Executor<'a, K, R> {
    pub(crate) fn new(
        kernel: &'a mut K,
        rng: &'a mut R,
        mode: RunMode,
        presets: Presets,
        max_loop_iterations: usize,
    ) -> Self {
        Self {
            kernel,
            rng,
            mode,
            presets,
            max_loop_iterations,
            clbits: BTreeMap::new(),
            path_probability: 1.0,
            stats: ExecutionStatistics::new(),
        }
    }

    /// Consume the executor, returning the classical store, path probability and counters
    pub(crate) fn finish(self) -> (BTreeMap<usize, bool>, f64, ExecutionStatistics) {
        (self.clbits, self.path_probability, self.stats)
    }

    pub(crate) fn execute_blocks(&mut self, blocks: &[Block]) -> Result<LoopControl> {
        for block in blocks {
            let control = match block {
                Block::Flat(flat) => self.run_flat(flat)?,
                Block::Branch(branch) => self.run_branch(branch)?,
                Block::Loop(lp) => self.run_loop(lp)?,
            };
            if control == LoopControl::Break {
                return Ok(LoopControl::Break);
            }
        }
        Ok(LoopControl::Continue)
    }

    fn run_flat(&mut self, flat: &FlatBlock) -> Result<LoopControl> {
        for op in flat.ops() {
            if op.kind() == GateKind::Break {
                return Ok(LoopControl::Break);
            }
            self.dispatch(op)?;
        }
        Ok(LoopControl::Continue)
    }

    fn run_branch(&mut self, branch: &BranchBlock) -> Result<LoopControl> {
        let value = self.read(branch.selector());
        trace!(selector = %branch.selector(), value, "branch");
        self.stats.branches_taken += 1;
        self.execute_blocks(branch.dispatch(value))
    }

    fn run_loop(&mut self, lp: &LoopBlock) -> Result<LoopControl> {
        let mut iteration = 0;
        loop {
            if self.read(lp.selector()) != lp.expected() {
                break;
            }
            if iteration >= self.max_loop_iterations {
                warn!(limit = self.max_loop_iterations, "loop bound exceeded");
                return Err(SimulatorError::LoopBoundExceeded {
                    limit: self.max_loop_iterations,
                });
            }
            trace!(iteration, selector = %lp.selector(), "loop iteration");
            iteration += 1;
            self.stats.loop_iterations += 1;
            if self.execute_blocks(lp.body())? == LoopControl::Break {
                debug!(iteration, "loop left by break");
                break;
            }
        }
        Ok(LoopControl::Continue)
    }

    fn read(&self, selector: &Selector) -> u64 {
        selector.read(|c| self.clbits.get(&c).copied().unwrap_or(false))
    }

    fn dispatch(&mut self, op: &GateOp) -> Result<()> {
        let q = op.qubits();
        let arity = op.kind().arity();
        if !arity.accepts(q.len()) {
            return Err(BuildError::arity(op.kind().name(), arity.to_string(), q.len()).into());
        }

        let kernel = &mut *self.kernel;
        match op.kind() {
            GateKind::Measure => {
                for (&qubit, &clbit) in q.iter().zip(op.clbits()) {
                    if op.is_final() {
                        self.measure_final(qubit, clbit)?;
                    } else {
                        self.measure_mid(qubit, clbit)?;
                    }
                }
                return Ok(());
            }
            GateKind::Break => return Ok(()),
            GateKind::X => kernel.x(q[0])?,
            GateKind::Y => kernel.y(q[0])?,
            GateKind::Z => kernel.z(q[0])?,
            GateKind::H => kernel.h(q[0])?,
            GateKind::S => kernel.s(q[0])?,
            GateKind::Sdg => kernel.sdg(q[0])?,
            GateKind::T => kernel.t(q[0])?,
            GateKind::Tdg => kernel.tdg(q[0])?,
            GateKind::X2p => kernel.x2p(q[0])?,
            GateKind::Y2p => kernel.y2p(q[0])?,
            GateKind::Cx => kernel.cnot(q[0], q[1])?,
            GateKind::Cz => kernel.cz(q[0], q[1])?,
            GateKind::Swap => kernel.swap(q[0], q[1])?,
            GateKind::Ccx => kernel.toffoli(q[0], q[1], q[2])?,
            GateKind::Cswap => kernel.fredkin(q[0], q[1], q[2])?,
            GateKind::Mcx => kernel.mcx(&q[..q.len() - 1], q[q.len() - 1])?,
            GateKind::Cwalk => kernel.cwalk(q[0], &q[1..])?,
            GateKind::Reset => kernel.reset(q[0])?,
        }
        self.stats.gates_applied += 1;
        Ok(())
    }

    /// Unnormalized probabilities of 0 and 1 on `qubit`
    fn outcome_probabilities(&mut self, qubit: usize) -> Result<(f64, f64)> {
        let p0 = self.kernel.get_prob(&[qubit], &[false])?;
        let p1 = self.kernel.get_prob(&[qubit], &[true])?;
        Ok((p0, p1))
    }

    fn draw(&mut self, p0: f64) -> bool {
        self.rng.gen::<f64>() >= p0
    }

    /// Read-out without collapse; leaves the path probability alone
    fn measure_final(&mut self, qubit: usize, clbit: usize) -> Result<()> {
        let forced = match self.mode {
            RunMode::Preset => self.presets.pop(clbit),
            RunMode::Sample => None,
        };
        let outcome = match forced {
            Some(outcome) => outcome,
            None => {
                let (p0, p1) = self.outcome_probabilities(qubit)?;
                let norm = p0 + p1;
                let p0 = if norm > 0.0 { p0 / norm } else { 0.5 };
                self.draw(p0)
            }
        };
        trace!(qubit, clbit, outcome, "final measurement");
        self.stats.final_measurements += 1;
        self.clbits.insert(clbit, outcome);
        Ok(())
    }

    /// Collapsing measurement; scales the path probability by the outcome's
    /// conditional probability
    fn measure_mid(&mut self, qubit: usize, clbit: usize) -> Result<()> {
        let (p0, p1) = self.outcome_probabilities(qubit)?;
        let norm = p0 + p1;
        if norm == 0.0 {
            warn!(qubit, "measurement on a zero-probability path");
            return Err(SimulatorError::ZeroProbability { qubit });
        }
        let p0 = p0 / norm;

        let outcome = match self.mode {
            RunMode::Sample => self.draw(p0),
            RunMode::Preset => self
                .presets
                .pop(clbit)
                .ok_or(SimulatorError::PresetExhausted { clbit })?,
        };

        let branch = if outcome { 1.0 - p0 } else { p0 };
        if branch == 0.0 {
            warn!(qubit, clbit, outcome, "forced outcome has probability zero");
            return Err(SimulatorError::ImpossibleOutcome {
                qubit,
                clbit,
                outcome,
            });
        }
        self.path_probability *= branch;
        self.kernel.mid_measure(&[qubit], &[outcome])?;
        debug!(
            qubit,
            clbit,
            outcome,
            p0,
            path_probability = self.path_probability,
            "mid-circuit measurement"
        );
        self.stats.mid_measurements += 1;
        self.clbits.insert(clbit, outcome);
        Ok(())
    }
}
