//! Clifford+T gates on [`CombState`]
//!
//! Permutation gates rewrite each digit in place. Phase and superposition
//! gates run a ripple-carry adder and may grow each vector by one digit,
//! which the overflow check then trims again.

use crate::arith::{increment, ripple_add, sign_extended};
use crate::comb_state::CombState;
use crate::error::Result;
use qdyn_bdd::{Bdd, BddManager, Var};

/// `x` with the value of `t` flipped
fn flip(m: &mut BddManager, x: Bdd, t: Var) -> Bdd {
    let x0 = m.restrict(x, &[(t, false)]);
    let x1 = m.restrict(x, &[(t, true)]);
    let tv = m.var(t);
    m.ite(tv, x0, x1)
}

/// `x` with `target` flipped wherever every control is true
fn controlled_flip(m: &mut BddManager, x: Bdd, controls: &[Var], target: Var) -> Bdd {
    let literals: Vec<Bdd> = controls.iter().map(|&c| m.var(c)).collect();
    let enabled = m.and_all(literals);

    let mut when_zero: Vec<(Var, bool)> = controls.iter().map(|&c| (c, true)).collect();
    let mut when_one = when_zero.clone();
    when_zero.push((target, false));
    when_one.push((target, true));
    let x0 = m.restrict(x, &when_zero);
    let x1 = m.restrict(x, &when_one);

    let tv = m.var(target);
    let flipped = m.ite(tv, x0, x1);
    m.ite(enabled, flipped, x)
}

/// Negate the coefficient wherever `cond` holds
fn negate_where(m: &mut BddManager, digits: &[Bdd], cond: Bdd) -> Vec<Bdd> {
    let inverted: Vec<Bdd> = digits.iter().map(|&x| m.xor(cond, x)).collect();
    increment(m, &inverted, cond)
}

/// `flip(x)` with the coefficient negated wherever `cond` holds
fn negate_flipped(m: &mut BddManager, digits: &[Bdd], t: Var, cond: Bdd) -> Vec<Bdd> {
    let flipped: Vec<Bdd> = digits.iter().map(|&x| flip(m, x, t)).collect();
    negate_where(m, &flipped, cond)
}

/// `y - flip(x)` when `subtract`, otherwise `y + flip(x)`
fn add_flipped(m: &mut BddManager, y: &[Bdd], x: &[Bdd], t: Var, subtract: bool) -> Vec<Bdd> {
    let operand: Vec<Bdd> = x
        .iter()
        .map(|&xi| {
            let f = flip(m, xi, t);
            if subtract {
                m.not(f)
            } else {
                f
            }
        })
        .collect();
    let carry_in = if subtract { Bdd::TRUE } else { Bdd::FALSE };
    ripple_add(m, y, &operand, carry_in)
}

/// Pick `then` where `cond` holds and `otherwise` elsewhere, digit by digit
fn select(m: &mut BddManager, cond: Bdd, then: &[Bdd], otherwise: &[Bdd]) -> Vec<Bdd> {
    let picked = then
        .iter()
        .zip(otherwise)
        .map(|(&y, &x)| m.ite(cond, y, x))
        .collect();
    sign_extended(picked)
}

/// `x` where `cond` is false and `-y` where it is true
fn select_negated(m: &mut BddManager, cond: Bdd, x: &[Bdd], y: &[Bdd]) -> Vec<Bdd> {
    let mixed: Vec<Bdd> = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let ny = m.not(yi);
            m.ite(cond, ny, xi)
        })
        .collect();
    increment(m, &mixed, cond)
}

impl CombState {
    /// Pauli X
    pub fn x(&mut self, target: usize) -> Result<()> {
        self.check_qubits(&[target])?;
        let t = self.qubit(target);
        self.map_digits(|m, x| flip(m, x, t));
        self.simplify_tail();
        Ok(())
    }

    /// Pauli Y
    pub fn y(&mut self, target: usize) -> Result<()> {
        self.check_qubits(&[target])?;
        let t = self.qubit(target);
        let m = &mut self.manager;
        let tv = m.var(t);
        let ntv = m.not(tv);

        let a = negate_flipped(m, &self.c, t, ntv);
        let b = negate_flipped(m, &self.d, t, ntv);
        let c = negate_flipped(m, &self.a, t, tv);
        let d = negate_flipped(m, &self.b, t, tv);
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.simplify_overflow();
        self.simplify_tail();
        Ok(())
    }

    /// Pauli Z
    pub fn z(&mut self, target: usize) -> Result<()> {
        self.check_qubits(&[target])?;
        let t = self.qubit(target);
        let tv = self.manager.var(t);
        self.map_vectors(|m, digits| negate_where(m, digits, tv));
        self.simplify_overflow();
        self.simplify_tail();
        Ok(())
    }

    /// Hadamard
    pub fn h(&mut self, target: usize) -> Result<()> {
        self.check_qubits(&[target])?;
        let t = self.qubit(target);
        let tv = self.manager.var(t);
        self.map_vectors(|m, digits| {
            let mut low = Vec::with_capacity(digits.len());
            let mut high = Vec::with_capacity(digits.len());
            for &x in digits {
                let x0 = m.restrict(x, &[(t, false)]);
                let x1 = m.restrict(x, &[(t, true)]);
                let nx = m.not(x);
                // x[t=1] where t is 0, the complement of x where t is 1
                low.push(x0);
                high.push(m.ite(tv, nx, x1));
            }
            ripple_add(m, &low, &high, tv)
        });
        self.k += 1;
        self.simplify_overflow();
        self.simplify_tail();
        Ok(())
    }

    /// Phase gate `diag(1, i)`
    pub fn s(&mut self, target: usize) -> Result<()> {
        self.check_qubits(&[target])?;
        let t = self.qubit(target);
        let m = &mut self.manager;
        let tv = m.var(t);

        let a = select(m, tv, &self.c, &self.a);
        let b = select(m, tv, &self.d, &self.b);
        let c = select_negated(m, tv, &self.c, &self.a);
        let d = select_negated(m, tv, &self.d, &self.b);
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.simplify_overflow();
        self.simplify_tail();
        Ok(())
    }

    /// Inverse phase gate
    pub fn sdg(&mut self, target: usize) -> Result<()> {
        self.z(target)?;
        self.s(target)
    }

    /// π/8 gate `diag(1, ω)`
    pub fn t(&mut self, target: usize) -> Result<()> {
        self.check_qubits(&[target])?;
        let t = self.qubit(target);
        let m = &mut self.manager;
        let tv = m.var(t);

        let a = select(m, tv, &self.b, &self.a);
        let b = select(m, tv, &self.c, &self.b);
        let c = select(m, tv, &self.d, &self.c);
        let d = select_negated(m, tv, &self.d, &self.a);
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.simplify_overflow();
        self.simplify_tail();
        Ok(())
    }

    /// Inverse π/8 gate
    pub fn tdg(&mut self, target: usize) -> Result<()> {
        self.z(target)?;
        self.s(target)?;
        self.t(target)
    }

    /// `Rx(π/2)` up to global phase
    pub fn x2p(&mut self, target: usize) -> Result<()> {
        self.check_qubits(&[target])?;
        let t = self.qubit(target);
        let m = &mut self.manager;

        let a = add_flipped(m, &self.a, &self.c, t, true);
        let b = add_flipped(m, &self.b, &self.d, t, true);
        let c = add_flipped(m, &self.c, &self.a, t, false);
        let d = add_flipped(m, &self.d, &self.b, t, false);
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.k += 1;
        self.simplify_overflow();
        self.simplify_tail();
        Ok(())
    }

    /// `Ry(π/2)`
    pub fn y2p(&mut self, target: usize) -> Result<()> {
        self.check_qubits(&[target])?;
        let t = self.qubit(target);
        let tv = self.manager.var(t);
        let ntv = self.manager.not(tv);
        self.map_vectors(|m, digits| {
            let mut low = Vec::with_capacity(digits.len());
            let mut high = Vec::with_capacity(digits.len());
            for &x in digits {
                let x0 = m.restrict(x, &[(t, false)]);
                let x1 = m.restrict(x, &[(t, true)]);
                let nx1 = m.not(x1);
                low.push(x0);
                high.push(m.ite(tv, x, nx1));
            }
            ripple_add(m, &low, &high, ntv)
        });
        self.k += 1;
        self.simplify_overflow();
        self.simplify_tail();
        Ok(())
    }

    /// Controlled NOT
    pub fn cnot(&mut self, control: usize, target: usize) -> Result<()> {
        self.mcx(&[control], target)
    }

    /// Controlled Z
    pub fn cz(&mut self, control: usize, target: usize) -> Result<()> {
        self.check_qubits(&[control, target])?;
        let cv = self.manager.var(self.qubit(control));
        let tv = self.manager.var(self.qubit(target));
        let both = self.manager.and(cv, tv);
        self.map_vectors(|m, digits| negate_where(m, digits, both));
        self.simplify_overflow();
        self.simplify_tail();
        Ok(())
    }

    /// Exchange two qubits
    pub fn swap(&mut self, first: usize, second: usize) -> Result<()> {
        self.check_qubits(&[first, second])?;
        self.cnot(first, second)?;
        self.cnot(second, first)?;
        self.cnot(first, second)
    }

    /// Doubly controlled NOT
    pub fn toffoli(&mut self, control1: usize, control2: usize, target: usize) -> Result<()> {
        self.mcx(&[control1, control2], target)
    }

    /// Controlled swap
    pub fn fredkin(&mut self, control: usize, target1: usize, target2: usize) -> Result<()> {
        self.check_qubits(&[control, target1, target2])?;
        let (c, t1, t2) = (self.qubit(control), self.qubit(target1), self.qubit(target2));
        let cv = self.manager.var(c);
        let t1v = self.manager.var(t1);
        let t2v = self.manager.var(t2);
        let differ = self.manager.xor(t1v, t2v);
        let enabled = self.manager.and(cv, differ);

        self.map_digits(|m, x| {
            let from_01 = m.restrict(x, &[(c, true), (t1, false), (t2, true)]);
            let from_10 = m.restrict(x, &[(c, true), (t1, true), (t2, false)]);
            // on the enabled region t1 != t2, so t1 alone picks the source
            let swapped = m.ite(t1v, from_01, from_10);
            m.ite(enabled, swapped, x)
        });
        self.simplify_tail();
        Ok(())
    }

    /// NOT on `target` controlled by every qubit in `controls`
    ///
    /// An empty control list is a plain X.
    pub fn mcx(&mut self, controls: &[usize], target: usize) -> Result<()> {
        let mut qubits = controls.to_vec();
        qubits.push(target);
        self.check_qubits(&qubits)?;

        let controls: Vec<Var> = controls.iter().map(|&c| self.qubit(c)).collect();
        let t = self.qubit(target);
        self.map_digits(|m, x| controlled_flip(m, x, &controls, t));
        self.simplify_tail();
        Ok(())
    }

    /// Coin-controlled walk step on the `targets` register
    ///
    /// `targets` is read most significant first. The register is incremented
    /// when `control` is 0 and decremented when it is 1, modulo its size.
    pub fn cwalk(&mut self, control: usize, targets: &[usize]) -> Result<()> {
        let mut qubits = vec![control];
        qubits.extend_from_slice(targets);
        self.check_qubits(&qubits)?;

        self.x(control)?;
        for i in 0..targets.len() {
            let mut controls = vec![control];
            controls.extend_from_slice(&targets[i + 1..]);
            self.mcx(&controls, targets[i])?;
        }
        self.x(control)?;
        for i in (0..targets.len()).rev() {
            let mut controls = vec![control];
            controls.extend_from_slice(&targets[i + 1..]);
            self.mcx(&controls, targets[i])?;
        }
        Ok(())
    }

    /// Force `target` to `|0⟩`, folding the `|1⟩` branch onto it
    pub fn reset(&mut self, target: usize) -> Result<()> {
        self.check_qubits(&[target])?;
        let t = self.qubit(target);
        let ntv = self.manager.nvar(t);
        self.map_digits(|m, x| {
            let x0 = m.restrict(x, &[(t, false)]);
            let x1 = m.restrict(x, &[(t, true)]);
            let merged = m.or(x0, x1);
            m.and(ntv, merged)
        });
        self.simplify_tail();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn assert_amp(state: &mut CombState, basis: u64, expected: Complex64) {
        let amp = state.get_amplitude(basis).unwrap();
        assert_relative_eq!(amp.re, expected.re, epsilon = 1e-12);
        assert_relative_eq!(amp.im, expected.im, epsilon = 1e-12);
    }

    fn zero(n: usize) -> CombState {
        CombState::zero_state(n, 8).unwrap()
    }

    #[test]
    fn test_x_flips_basis() {
        let mut state = zero(2);
        state.x(1).unwrap();
        assert_amp(&mut state, 0b01, Complex64::new(1.0, 0.0));
        assert_amp(&mut state, 0b00, Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_hadamard_superposition() {
        let mut state = zero(1);
        state.h(0).unwrap();
        assert_amp(&mut state, 0, Complex64::new(FRAC_1_SQRT_2, 0.0));
        assert_amp(&mut state, 1, Complex64::new(FRAC_1_SQRT_2, 0.0));

        state.h(0).unwrap();
        assert_amp(&mut state, 0, Complex64::new(1.0, 0.0));
        assert_amp(&mut state, 1, Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_hadamard_on_one_gives_minus() {
        let mut state = zero(1);
        state.x(0).unwrap();
        state.h(0).unwrap();
        assert_amp(&mut state, 0, Complex64::new(FRAC_1_SQRT_2, 0.0));
        assert_amp(&mut state, 1, Complex64::new(-FRAC_1_SQRT_2, 0.0));
    }

    #[test]
    fn test_y_on_zero() {
        let mut state = zero(1);
        state.y(0).unwrap();
        assert_amp(&mut state, 0, Complex64::new(0.0, 0.0));
        assert_amp(&mut state, 1, Complex64::new(0.0, 1.0));
    }

    #[test]
    fn test_z_phase() {
        let mut state = zero(1);
        state.x(0).unwrap();
        state.z(0).unwrap();
        assert_amp(&mut state, 1, Complex64::new(-1.0, 0.0));
    }

    #[test]
    fn test_s_and_t_phases() {
        let mut state = zero(1);
        state.x(0).unwrap();
        state.s(0).unwrap();
        assert_amp(&mut state, 1, Complex64::new(0.0, 1.0));

        let mut state = zero(1);
        state.x(0).unwrap();
        state.t(0).unwrap();
        assert_amp(&mut state, 1, Complex64::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2));

        state.tdg(0).unwrap();
        assert_amp(&mut state, 1, Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_sdg_undoes_s() {
        let mut state = zero(1);
        state.h(0).unwrap();
        state.s(0).unwrap();
        state.sdg(0).unwrap();
        assert_amp(&mut state, 1, Complex64::new(FRAC_1_SQRT_2, 0.0));
    }

    #[test]
    fn test_t_squared_is_s() {
        let mut a = zero(1);
        a.h(0).unwrap();
        a.t(0).unwrap();
        a.t(0).unwrap();

        let mut b = zero(1);
        b.h(0).unwrap();
        b.s(0).unwrap();

        for basis in 0..2 {
            let expected = b.get_amplitude(basis).unwrap();
            assert_amp(&mut a, basis, expected);
        }
    }

    #[test]
    fn test_x2p_and_y2p() {
        // Rx(π/2)|0⟩ = (|0⟩ - i|1⟩)/√2
        let mut state = zero(1);
        state.x2p(0).unwrap();
        assert_amp(&mut state, 0, Complex64::new(FRAC_1_SQRT_2, 0.0));
        assert_amp(&mut state, 1, Complex64::new(0.0, -FRAC_1_SQRT_2));

        // Ry(π/2)|0⟩ = (|0⟩ + |1⟩)/√2
        let mut state = zero(1);
        state.y2p(0).unwrap();
        assert_amp(&mut state, 0, Complex64::new(FRAC_1_SQRT_2, 0.0));
        assert_amp(&mut state, 1, Complex64::new(FRAC_1_SQRT_2, 0.0));
    }

    #[test]
    fn test_bell_state() {
        let mut state = zero(2);
        state.h(0).unwrap();
        state.cnot(0, 1).unwrap();
        assert_amp(&mut state, 0b00, Complex64::new(FRAC_1_SQRT_2, 0.0));
        assert_amp(&mut state, 0b11, Complex64::new(FRAC_1_SQRT_2, 0.0));
        assert_amp(&mut state, 0b01, Complex64::new(0.0, 0.0));
        assert_amp(&mut state, 0b10, Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_toffoli_on_110() {
        let mut state = CombState::new(3, 8).unwrap();
        state.init_basis_state(0b110).unwrap();
        state.toffoli(0, 1, 2).unwrap();
        assert_amp(&mut state, 0b111, Complex64::new(1.0, 0.0));
        assert_amp(&mut state, 0b110, Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_fredkin_and_swap() {
        let mut state = CombState::new(3, 8).unwrap();
        state.init_basis_state(0b110).unwrap();
        state.fredkin(0, 1, 2).unwrap();
        assert_amp(&mut state, 0b101, Complex64::new(1.0, 0.0));

        state.swap(0, 2).unwrap();
        assert_amp(&mut state, 0b101, Complex64::new(1.0, 0.0));
        state.swap(1, 2).unwrap();
        assert_amp(&mut state, 0b110, Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_cz_phase() {
        let mut state = CombState::new(2, 8).unwrap();
        state.init_basis_state(0b11).unwrap();
        state.cz(0, 1).unwrap();
        assert_amp(&mut state, 0b11, Complex64::new(-1.0, 0.0));
    }

    #[test]
    fn test_cwalk_decrements_when_control_set() {
        // control q0 = 1, register [q2, q1] holds 2
        let mut state = CombState::new(3, 8).unwrap();
        state.init_basis_state(0b101).unwrap();
        state.cwalk(0, &[2, 1]).unwrap();
        // 2 - 1 = 1: q2 = 0, q1 = 1
        assert_amp(&mut state, 0b110, Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_cwalk_increments_when_control_clear() {
        // control q0 = 0, register [q2, q1] holds 1
        let mut state = CombState::new(3, 8).unwrap();
        state.init_basis_state(0b010).unwrap();
        state.cwalk(0, &[2, 1]).unwrap();
        // 1 + 1 = 2: q2 = 1, q1 = 0
        assert_amp(&mut state, 0b001, Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_reset() {
        let mut state = zero(2);
        state.x(0).unwrap();
        state.reset(0).unwrap();
        assert_amp(&mut state, 0b00, Complex64::new(1.0, 0.0));
        assert_amp(&mut state, 0b10, Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_gate_rejects_bad_qubits() {
        let mut state = zero(2);
        assert!(state.h(2).is_err());
        assert!(state.cnot(1, 1).is_err());
        assert!(state.mcx(&[0, 5], 1).is_err());
    }

    #[test]
    fn test_amplitudes_match_norm() {
        let mut state = zero(3);
        state.h(0).unwrap();
        state.t(0).unwrap();
        state.h(1).unwrap();
        state.cnot(1, 2).unwrap();
        state.s(2).unwrap();
        let norm: f64 = state.amplitudes().unwrap().iter().map(|a| a.norm_sqr()).sum();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
    }
}
