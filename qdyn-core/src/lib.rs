//! Circuit IR for dynamic Clifford+T programs
//!
//! This crate turns a structured source program into the block tree the
//! simulator interprets:
//! - [`Program`]: registers plus a statement tree (gates, measurements,
//!   `if`/`switch`, bounded `for`, `while`, `break`)
//! - [`GateOp`]: one lowered kernel operation on global indices
//! - [`Block`]: flat runs, multi-way branches and validated loops
//!
//! Gates outside Clifford+T, and rotation angles without an exact
//! Clifford+T form, are rejected by [`build`].
//!
//! # Example
//! ```
//! use qdyn_core::{build, Block, Operand, Program, RegisterLayout, Statement};
//!
//! let mut layout = RegisterLayout::new();
//! layout.add_qreg("q", 2).unwrap();
//! let mut program = Program::new(layout);
//! program
//!     .push(Statement::gate("h", [Operand::new("q", 0)]))
//!     .push(Statement::gate("cnot", [Operand::new("q", 0), Operand::new("q", 1)]));
//!
//! let blocks = build(&program).unwrap();
//! assert!(matches!(blocks[0], Block::Flat(_)));
//! ```

pub mod block;
pub mod builder;
pub mod error;
pub mod gate;
pub mod lowering;
pub mod program;

// Re-exports for convenience
pub use block::{Block, BranchBlock, FlatBlock, LoopBlock, Selector};
pub use builder::{build, mark_final_measurements};
pub use error::{BuildError, Result};
pub use gate::{Arity, GateKind, GateOp};
pub use lowering::{lower_gate, ANGLE_TOLERANCE};
pub use program::{
    BinOp, ClassicalTarget, Condition, Expr, Operand, Program, Register, RegisterLayout, Scope,
    Statement,
};
