//! Exact simulation of dynamic Clifford+T circuits
//!
//! This crate interprets the block tree produced by `qdyn-core` on an exact
//! amplitude kernel from `qdyn-state`. Classical bits written by mid-circuit
//! measurements drive branches and while loops.
//!
//! # Features
//!
//! - **Sample mode**: outcomes drawn from the kernel's exact distribution
//! - **Preset mode**: mid-circuit outcomes forced from per-bit queues, giving
//!   the exact probability of one execution path
//! - **Final measurements**: read-out without collapse, so the final state
//!   can still be inspected
//! - **Pluggable kernels**: any [`Kernel`](qdyn_state::Kernel), including the
//!   sequential [`SeqState`](qdyn_state::SeqState)
//!
//! # Example
//!
//! ```
//! use qdyn_core::{Condition, Operand, Program, RegisterLayout, Statement};
//! use qdyn_sim::{Presets, RunMode, Simulator, SimulatorConfig};
//!
//! // retry until the ancilla reads 0
//! let mut layout = RegisterLayout::new();
//! layout.add_qreg("q", 1).unwrap();
//! layout.add_creg("c", 1).unwrap();
//! let q = || Operand::new("q", 0);
//! let c = || Operand::new("c", 0);
//! let trial = || {
//!     vec![
//!         Statement::gate("h", [q()]),
//!         Statement::measure(q(), c()),
//!     ]
//! };
//!
//! let mut program = Program::new(layout);
//! program.statements.extend(trial());
//! program.push(Statement::while_loop(
//!     Condition::bit(c()),
//!     std::iter::once(Statement::gate("x", [q()])).chain(trial()).collect(),
//! ));
//!
//! let mut sim = Simulator::from_program(&program, SimulatorConfig::default()).unwrap();
//! let presets = Presets::trial_sequence(0, 3, true, false);
//! let result = sim.run(RunMode::Preset, Some(presets)).unwrap();
//! assert!((result.path_probability - 0.125).abs() < 1e-12);
//! ```

pub mod config;
pub mod error;
mod executor;
pub mod presets;
pub mod result;
pub mod simulator;
pub mod statistics;

pub use config::{SimulatorConfig, DEFAULT_MAX_LOOP_ITERATIONS};
pub use error::{Result, SimulatorError};
pub use presets::{Presets, RunMode};
pub use result::{MeasurementCounts, RunResult};
pub use simulator::Simulator;
pub use statistics::ExecutionStatistics;
