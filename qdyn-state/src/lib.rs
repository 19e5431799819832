//! Exact amplitude kernels for Clifford+T circuits
//!
//! This crate stores quantum states symbolically instead of as amplitude
//! vectors. Every amplitude of an `n`-qubit register is an element of
//! `Z[ω]/√2^k` with `ω = e^{iπ/4}`, and its four integer coefficients are
//! kept as vectors of decision diagrams over the qubit variables.
//!
//! # State Representations
//!
//! - [`CombState`]: the whole register, updated gate by gate
//! - [`SeqState`]: a stored register carried across iterations of a
//!   sequential circuit, with fresh input qubits each iteration
//!
//! Both implement [`Kernel`], the interface the execution engine drives.
//!
//! # Exactness
//!
//! Measurement probabilities are computed from exact integer sums. A
//! probability that cancels to zero is reported as exactly `0.0`, so an
//! impossible branch can never be mistaken for a tiny one.
//!
//! # Example
//!
//! ```
//! use qdyn_state::CombState;
//!
//! let mut state = CombState::zero_state(2, 32).unwrap();
//! state.h(0).unwrap();
//! state.cnot(0, 1).unwrap();
//! let p = state.get_prob(&[0, 1], &[true, false]).unwrap();
//! assert_eq!(p, 0.0);
//! ```

mod arith;
pub mod comb_state;
pub mod error;
mod gates;
pub mod kernel;
mod numeric;
mod probability;
pub mod seq_state;

pub use comb_state::{Coefficient, CombState, DEFAULT_PRECISION, MAX_ENUMERABLE_QUBITS};
pub use error::{Result, StateError};
pub use kernel::Kernel;
pub use seq_state::SeqState;
