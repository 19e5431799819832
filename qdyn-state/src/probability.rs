//! Measurement probabilities and projective collapse on [`CombState`]

use crate::comb_state::{Coefficient, CombState};
use crate::error::{Result, StateError};
use crate::numeric::{digit_weight, is_exact_zero, sqrt2_combination};
use num_bigint::BigInt;
use num_traits::Zero;
use qdyn_bdd::{Bdd, Var};
use std::collections::BTreeSet;
use tracing::trace;

impl CombState {
    /// Probability of observing `outcomes` on `targets`
    ///
    /// The value is `Σ |amp(x)|²` over every basis `x` that agrees with the
    /// outcomes, so it is relative to the current (possibly unnormalized)
    /// state. Exact cancellations return exactly `0.0`.
    pub fn get_prob(&mut self, targets: &[usize], outcomes: &[bool]) -> Result<f64> {
        let assignment = self.assignment(targets, outcomes)?;
        let measured: BTreeSet<usize> = targets.iter().copied().collect();
        let free = self.num_qubits - measured.len();

        let [a, b, c, d] = Coefficient::ALL.map(|which| self.restricted(which, &assignment));

        let aa = self.inner_product(&a, &a, free);
        let bb = self.inner_product(&b, &b, free);
        let cc = self.inner_product(&c, &c, free);
        let dd = self.inner_product(&d, &d, free);
        let ab = self.inner_product(&a, &b, free);
        let bc = self.inner_product(&b, &c, free);
        let cd = self.inner_product(&c, &d, free);
        let ad = self.inner_product(&a, &d, free);

        // |aω³ + bω² + cω + d|² = a²+b²+c²+d² + √2(ab + bc + cd - ad)
        let rational = aa + bb + cc + dd;
        let irrational = ab + bc + cd - ad;

        if is_exact_zero(&rational, &irrational) {
            trace!(?targets, ?outcomes, "exact zero probability");
            return Ok(0.0);
        }
        Ok(sqrt2_combination(&rational, &irrational, self.k))
    }

    /// Project onto `outcomes` for `targets` without renormalizing
    pub fn mid_measure(&mut self, targets: &[usize], outcomes: &[bool]) -> Result<()> {
        let assignment = self.assignment(targets, outcomes)?;
        let constraint = self.manager.cube(&assignment);
        self.map_digits(|m, x| {
            let fixed = m.restrict(x, &assignment);
            m.and(fixed, constraint)
        });
        self.simplify_tail();
        Ok(())
    }

    /// Validated variable assignment for a measurement
    pub(crate) fn assignment(&self, targets: &[usize], outcomes: &[bool]) -> Result<Vec<(Var, bool)>> {
        if targets.len() != outcomes.len() {
            return Err(StateError::OutcomeLengthMismatch {
                expected: targets.len(),
                actual: outcomes.len(),
            });
        }
        if let Some(&bad) = targets.iter().find(|&&q| q >= self.num_qubits) {
            return Err(StateError::invalid_qubit(bad, self.num_qubits));
        }
        Ok(targets
            .iter()
            .zip(outcomes)
            .map(|(&q, &bit)| (self.qubit(q), bit))
            .collect())
    }

    /// `Σ_x u(x)·v(x)` over the `free` unmeasured qubits
    fn inner_product(&mut self, u: &[Bdd], v: &[Bdd], free: usize) -> BigInt {
        let r = u.len();
        let mut total = BigInt::zero();
        for (i, &ui) in u.iter().enumerate() {
            if ui.is_false() {
                continue;
            }
            for (j, &vj) in v.iter().enumerate() {
                let both = self.manager.and(ui, vj);
                if both.is_false() {
                    continue;
                }
                let support = self.manager.support(both).len();
                let count = BigInt::from(self.manager.count(both)) << free.saturating_sub(support);
                total += digit_weight(i, r) * digit_weight(j, r) * count;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::SQRT_2;

    #[test]
    fn test_uniform_superposition() {
        let mut state = CombState::zero_state(2, 8).unwrap();
        state.h(0).unwrap();
        state.h(1).unwrap();
        assert_relative_eq!(state.get_prob(&[0], &[false]).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(state.get_prob(&[0, 1], &[true, false]).unwrap(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(state.total_probability().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_interference_gives_exact_zero() {
        let mut state = CombState::zero_state(1, 8).unwrap();
        state.h(0).unwrap();
        state.h(0).unwrap();
        assert_eq!(state.get_prob(&[0], &[true]).unwrap(), 0.0);
    }

    #[test]
    fn test_irrational_probability() {
        // H T H on |0⟩: P(0) = (2 + √2) / 4
        let mut state = CombState::zero_state(1, 8).unwrap();
        state.h(0).unwrap();
        state.t(0).unwrap();
        state.h(0).unwrap();
        let p0 = state.get_prob(&[0], &[false]).unwrap();
        let p1 = state.get_prob(&[0], &[true]).unwrap();
        assert_relative_eq!(p0, (2.0 + SQRT_2) / 4.0, epsilon = 1e-12);
        assert_relative_eq!(p1, (2.0 - SQRT_2) / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mid_measure_keeps_branch_weight() {
        let mut state = CombState::zero_state(2, 8).unwrap();
        state.h(0).unwrap();
        state.cnot(0, 1).unwrap();
        state.mid_measure(&[0], &[true]).unwrap();
        assert_relative_eq!(state.total_probability().unwrap(), 0.5, epsilon = 1e-12);
        assert_eq!(state.get_prob(&[1], &[false]).unwrap(), 0.0);
        assert_relative_eq!(state.get_prob(&[1], &[true]).unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_outcome_length_mismatch() {
        let mut state = CombState::zero_state(2, 8).unwrap();
        assert_eq!(
            state.get_prob(&[0, 1], &[true]),
            Err(StateError::OutcomeLengthMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_measure_out_of_range() {
        let mut state = CombState::zero_state(2, 8).unwrap();
        assert!(matches!(
            state.mid_measure(&[4], &[false]),
            Err(StateError::InvalidQubitIndex { index: 4, .. })
        ));
    }
}
