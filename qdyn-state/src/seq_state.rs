//! Sequential circuits: a stored register carried across iterations
//!
//! The register of `n` qubits is split into `n - m` input qubits (indices
//! `0..n-m`) and `m` stored qubits (indices `n-m..n`). Each iteration tensors
//! a fresh input basis state with the stored state, runs gates on the
//! combined register, measures every input qubit, and folds what remains back
//! into the stored state.

use crate::comb_state::{Coefficient, CombState};
use crate::error::{Result, StateError};
use num_complex::Complex64;
use qdyn_bdd::{Bdd, Var};
use tracing::debug;

/// Stored state, input state and combined state of a sequential circuit
#[derive(Debug, Clone)]
pub struct SeqState {
    num_qubits: usize,
    num_stored: usize,
    stored: CombState,
    input: CombState,
    combined: Option<CombState>,
    prob_list: Vec<f64>,
}

impl SeqState {
    /// Create a sequential state with `num_stored` of `num_qubits` qubits stored
    ///
    /// The stored and input states start as the zero function; call
    /// `init_stored_state*` and `init_input_state_by_basis` before combining.
    pub fn new(num_qubits: usize, num_stored: usize, precision: usize) -> Result<Self> {
        if num_stored > num_qubits {
            return Err(StateError::InvalidPartition {
                total: num_qubits,
                stored: num_stored,
            });
        }
        Ok(Self {
            num_qubits,
            num_stored,
            stored: CombState::new(num_stored, precision)?,
            input: CombState::new(num_qubits - num_stored, precision)?,
            combined: None,
            prob_list: Vec::new(),
        })
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Qubits carried from one iteration to the next
    #[inline]
    pub fn num_stored(&self) -> usize {
        self.num_stored
    }

    /// Qubits re-prepared and measured every iteration
    #[inline]
    pub fn num_input(&self) -> usize {
        self.num_qubits - self.num_stored
    }

    pub fn init_stored_state_by_basis(&mut self, basis: u64) -> Result<()> {
        self.stored.init_basis_state(basis)
    }

    /// Replace the stored state wholesale
    pub fn init_stored_state(&mut self, state: CombState) -> Result<()> {
        if state.num_qubits() != self.num_stored {
            return Err(StateError::BasisWidthMismatch {
                expected: self.num_stored,
                actual: state.num_qubits(),
            });
        }
        self.stored = state;
        Ok(())
    }

    pub fn init_input_state_by_basis(&mut self, basis: u64) -> Result<()> {
        self.input.init_basis_state(basis)
    }

    /// Tensor the input basis state with the stored state
    pub fn init_comb_state(&mut self) -> Result<()> {
        let r = self.input.precision().max(self.stored.precision());
        self.input.sign_extend(r);
        self.stored.sign_extend(r);

        let offset = self.num_input();
        let mut combined = CombState::new(self.num_qubits, r)?;
        let input_cube = self.input.coefficient(Coefficient::D)[0];
        let input_part = self
            .input
            .manager()
            .copy_into(input_cube, &mut combined.manager, |v| v);

        for which in Coefficient::ALL {
            let digits: Vec<Bdd> = self
                .stored
                .coefficient(which)
                .iter()
                .map(|&f| {
                    let shifted = self
                        .stored
                        .manager()
                        .copy_into(f, &mut combined.manager, |v| Var::new(v.index() + offset));
                    combined.manager.and(input_part, shifted)
                })
                .collect();
            *combined.vector_mut(which) = digits;
        }
        combined.k = self.stored.k();

        debug!(
            precision = r,
            k = combined.k,
            "combined input and stored states"
        );
        self.combined = Some(combined);
        Ok(())
    }

    /// Measure every input qubit and fold the rest into the stored state
    ///
    /// Records the cumulative probability of all outcomes seen so far.
    pub fn measure(&mut self, outcomes: &[bool]) -> Result<()> {
        let num_input = self.num_input();
        if outcomes.len() != num_input {
            return Err(StateError::OutcomeLengthMismatch {
                expected: num_input,
                actual: outcomes.len(),
            });
        }
        let targets: Vec<usize> = (0..num_input).collect();
        let (prob, assignment) = {
            let combined = self.combined_mut()?;
            let prob = combined.get_prob(&targets, outcomes)?;
            (prob, combined.assignment(&targets, outcomes)?)
        };
        let Some(mut combined) = self.combined.take() else {
            return Err(StateError::CombinedStateMissing);
        };
        self.prob_list.push(prob);

        combined.map_digits(|m, x| m.restrict(x, &assignment));
        combined.simplify_tail();

        let mut stored = CombState::new(self.num_stored, combined.precision())?;
        for which in Coefficient::ALL {
            let digits: Vec<Bdd> = combined
                .coefficient(which)
                .iter()
                .map(|&f| {
                    combined.manager().copy_into(f, &mut stored.manager, |v| {
                        Var::new(v.index().saturating_sub(num_input))
                    })
                })
                .collect();
            *stored.vector_mut(which) = digits;
        }
        stored.k = combined.k();
        self.stored = stored;

        debug!(prob, step = self.prob_list.len(), "folded measured iteration");
        Ok(())
    }

    /// Cumulative probabilities recorded by [`measure`](Self::measure)
    pub fn prob_list(&self) -> &[f64] {
        &self.prob_list
    }

    /// Probability of the latest iteration given all earlier ones
    ///
    /// `None` before the first iteration or once an earlier iteration reached
    /// probability zero.
    pub fn step_prob(&self) -> Option<f64> {
        match self.prob_list.as_slice() {
            [] => None,
            [only] => Some(*only),
            [.., prev, last] if *prev > 0.0 => Some(last / prev),
            [.., _, _] => None,
        }
    }

    pub fn stored_state(&self) -> &CombState {
        &self.stored
    }

    /// Combined state of the current iteration
    pub fn combined_state(&self) -> Option<&CombState> {
        self.combined.as_ref()
    }

    /// Normalized amplitude of a stored basis state
    pub fn stored_amplitude(&mut self, basis: u64) -> Result<Complex64> {
        let amp = self.stored.get_amplitude(basis)?;
        Ok(match self.prob_list.last() {
            Some(&p) if p > 0.0 => amp / p.sqrt(),
            _ => amp,
        })
    }

    pub(crate) fn combined_mut(&mut self) -> Result<&mut CombState> {
        self.combined.as_mut().ok_or(StateError::CombinedStateMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_invalid_partition() {
        assert!(matches!(
            SeqState::new(2, 3, 8),
            Err(StateError::InvalidPartition { total: 2, stored: 3 })
        ));
    }

    #[test]
    fn test_measure_requires_combined_state() {
        let mut seq = SeqState::new(2, 1, 8).unwrap();
        assert_eq!(seq.measure(&[false]), Err(StateError::CombinedStateMissing));
    }

    #[test]
    fn test_measure_checks_outcome_length() {
        let mut seq = SeqState::new(3, 1, 8).unwrap();
        seq.init_stored_state_by_basis(0).unwrap();
        seq.init_input_state_by_basis(0).unwrap();
        seq.init_comb_state().unwrap();
        assert!(matches!(
            seq.measure(&[false]),
            Err(StateError::OutcomeLengthMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_rejected_measure_keeps_combined_state() {
        let mut seq = SeqState::new(3, 1, 8).unwrap();
        seq.init_stored_state_by_basis(0).unwrap();
        seq.init_input_state_by_basis(0).unwrap();
        seq.init_comb_state().unwrap();
        seq.combined_mut().unwrap().h(0).unwrap();

        assert!(seq.measure(&[false]).is_err());
        assert!(seq.combined_state().is_some());
        assert!(seq.prob_list().is_empty());

        seq.measure(&[false, false]).unwrap();
        assert_relative_eq!(seq.prob_list()[0], 0.5, epsilon = 1e-12);
        assert!(seq.combined_state().is_none());
    }

    #[test]
    fn test_step_prob_after_impossible_iteration() {
        let mut seq = SeqState::new(2, 1, 8).unwrap();
        seq.init_stored_state_by_basis(0).unwrap();
        seq.init_input_state_by_basis(0).unwrap();
        seq.init_comb_state().unwrap();
        seq.measure(&[true]).unwrap();
        assert_eq!(seq.prob_list(), &[0.0]);
        assert_eq!(seq.step_prob(), Some(0.0));

        seq.init_input_state_by_basis(0).unwrap();
        seq.init_comb_state().unwrap();
        seq.measure(&[false]).unwrap();
        assert_eq!(seq.prob_list().len(), 2);
        assert_eq!(seq.step_prob(), None);
    }

    #[test]
    fn test_tensor_product_places_stored_qubits_last() {
        let mut seq = SeqState::new(3, 2, 8).unwrap();
        seq.init_stored_state_by_basis(0b10).unwrap();
        seq.init_input_state_by_basis(1).unwrap();
        seq.init_comb_state().unwrap();

        let combined = seq.combined.as_mut().unwrap();
        // input q0 = 1, stored q1 q2 = 10
        let amp = combined.get_amplitude(0b110).unwrap();
        assert_relative_eq!(amp.re, 1.0);
        assert_relative_eq!(combined.total_probability().unwrap(), 1.0);
    }

    #[test]
    fn test_iteration_folds_into_stored_state() {
        // one input qubit entangled with one stored qubit
        let mut seq = SeqState::new(2, 1, 8).unwrap();
        seq.init_stored_state_by_basis(0).unwrap();
        seq.init_input_state_by_basis(0).unwrap();
        seq.init_comb_state().unwrap();
        {
            let combined = seq.combined_mut().unwrap();
            combined.h(1).unwrap();
            combined.cnot(1, 0).unwrap();
        }
        seq.measure(&[true]).unwrap();

        assert_eq!(seq.prob_list().len(), 1);
        assert_relative_eq!(seq.step_prob().unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(seq.stored_amplitude(1).unwrap().re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(seq.stored_amplitude(0).unwrap().norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_step_prob_is_conditional() {
        let mut seq = SeqState::new(2, 1, 8).unwrap();
        seq.init_stored_state_by_basis(0).unwrap();
        for _ in 0..2 {
            seq.init_input_state_by_basis(0).unwrap();
            seq.init_comb_state().unwrap();
            seq.combined_mut().unwrap().h(0).unwrap();
            seq.measure(&[false]).unwrap();
        }
        assert_eq!(seq.prob_list().len(), 2);
        assert_relative_eq!(seq.prob_list()[1], 0.25, epsilon = 1e-12);
        assert_relative_eq!(seq.step_prob().unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(seq.stored_amplitude(0).unwrap().re, 1.0, epsilon = 1e-12);
    }
}
