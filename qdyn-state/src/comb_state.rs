//! Combinational amplitude state
//!
//! A [`CombState`] stores the full amplitude function of an `n`-qubit
//! register as four digit vectors `A`, `B`, `C`, `D` and a scale exponent
//! `k`. For a basis assignment `x`, each vector is read as an `r`-digit
//! two's-complement integer and
//!
//! ```text
//! amp(x) = (a(x)·ω³ + b(x)·ω² + c(x)·ω + d(x)) / √2^k,   ω = e^{iπ/4}
//! ```
//!
//! Qubit `i` is decision variable `q{i}`. Basis indices are big-endian over
//! qubits: qubit 0 is the most significant bit.

use crate::error::{Result, StateError};
use crate::numeric::{digits_value, ldexp};
use num_complex::Complex64;
use qdyn_bdd::{Bdd, BddManager, Var};
use smallvec::SmallVec;
use std::f64::consts::FRAC_1_SQRT_2;

/// Largest register [`CombState::amplitudes`] will enumerate
pub const MAX_ENUMERABLE_QUBITS: usize = 24;

/// Default number of digits per coefficient vector
pub const DEFAULT_PRECISION: usize = 32;

/// One of the four coefficient vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coefficient {
    /// Coefficient of ω³
    A,
    /// Coefficient of ω²
    B,
    /// Coefficient of ω
    C,
    /// Constant coefficient
    D,
}

impl Coefficient {
    pub const ALL: [Coefficient; 4] = [Self::A, Self::B, Self::C, Self::D];
}

/// Exact amplitude function of an `n`-qubit register
#[derive(Debug, Clone)]
pub struct CombState {
    pub(crate) manager: BddManager,
    pub(crate) num_qubits: usize,
    pub(crate) k: i32,
    pub(crate) a: Vec<Bdd>,
    pub(crate) b: Vec<Bdd>,
    pub(crate) c: Vec<Bdd>,
    pub(crate) d: Vec<Bdd>,
}

impl CombState {
    /// Create an all-zero state with `precision` digits per vector
    ///
    /// Call [`init_basis_state`](Self::init_basis_state) before applying gates.
    pub fn new(num_qubits: usize, precision: usize) -> Result<Self> {
        if precision < 2 {
            return Err(StateError::InsufficientPrecision { digits: precision });
        }
        Ok(Self {
            manager: BddManager::with_vars(num_qubits, "q"),
            num_qubits,
            k: 0,
            a: vec![Bdd::FALSE; precision],
            b: vec![Bdd::FALSE; precision],
            c: vec![Bdd::FALSE; precision],
            d: vec![Bdd::FALSE; precision],
        })
    }

    /// Create the state `|0…0⟩`
    pub fn zero_state(num_qubits: usize, precision: usize) -> Result<Self> {
        let mut state = Self::new(num_qubits, precision)?;
        state.init_basis_bits(&vec![false; num_qubits])?;
        Ok(state)
    }

    /// Set the state to the basis vector with index `basis`
    pub fn init_basis_state(&mut self, basis: u64) -> Result<()> {
        let n = self.num_qubits;
        if n < 64 && basis >> n != 0 {
            return Err(StateError::BasisOutOfRange {
                basis,
                num_qubits: n,
            });
        }
        let bits: Vec<bool> = (0..n).map(|i| basis_bit(basis, n, i)).collect();
        self.init_basis_bits(&bits)
    }

    /// Set the state to a basis vector given as one bit per qubit
    pub fn init_basis_bits(&mut self, bits: &[bool]) -> Result<()> {
        if bits.len() != self.num_qubits {
            return Err(StateError::BasisWidthMismatch {
                expected: self.num_qubits,
                actual: bits.len(),
            });
        }
        let literals: Vec<(Var, bool)> = bits
            .iter()
            .enumerate()
            .map(|(i, &bit)| (Var::new(i), bit))
            .collect();
        let cube = self.manager.cube(&literals);

        let r = self.precision();
        self.a = vec![Bdd::FALSE; r];
        self.b = vec![Bdd::FALSE; r];
        self.c = vec![Bdd::FALSE; r];
        self.d = vec![Bdd::FALSE; r];
        self.d[0] = cube;
        self.k = 0;
        Ok(())
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Current number of digits per vector
    #[inline]
    pub fn precision(&self) -> usize {
        self.d.len()
    }

    /// Scale exponent
    #[inline]
    pub fn k(&self) -> i32 {
        self.k
    }

    /// The manager owning every digit function
    pub fn manager(&self) -> &BddManager {
        &self.manager
    }

    /// Digit functions of one coefficient vector, least significant first
    pub fn coefficient(&self, which: Coefficient) -> &[Bdd] {
        match which {
            Coefficient::A => &self.a,
            Coefficient::B => &self.b,
            Coefficient::C => &self.c,
            Coefficient::D => &self.d,
        }
    }

    pub(crate) fn vector_mut(&mut self, which: Coefficient) -> &mut Vec<Bdd> {
        match which {
            Coefficient::A => &mut self.a,
            Coefficient::B => &mut self.b,
            Coefficient::C => &mut self.c,
            Coefficient::D => &mut self.d,
        }
    }

    /// Decision diagram nodes used by all digit functions together
    pub fn node_count(&self) -> usize {
        self.vectors()
            .iter()
            .flat_map(|v| v.iter())
            .map(|&f| self.manager.node_count(f))
            .sum()
    }

    /// Append copies of the sign digit until each vector has `precision` digits
    pub fn sign_extend(&mut self, precision: usize) {
        for v in [&mut self.a, &mut self.b, &mut self.c, &mut self.d] {
            if let Some(&top) = v.last() {
                v.resize(precision.max(v.len()), top);
            }
        }
    }

    /// Amplitude of basis vector `basis`
    pub fn get_amplitude(&mut self, basis: u64) -> Result<Complex64> {
        let n = self.num_qubits;
        if n < 64 && basis >> n != 0 {
            return Err(StateError::BasisOutOfRange {
                basis,
                num_qubits: n,
            });
        }
        let bits: Vec<bool> = (0..n).map(|i| basis_bit(basis, n, i)).collect();
        self.get_amplitude_bits(&bits)
    }

    /// Amplitude of a basis vector given as one bit per qubit
    pub fn get_amplitude_bits(&mut self, bits: &[bool]) -> Result<Complex64> {
        if bits.len() != self.num_qubits {
            return Err(StateError::BasisWidthMismatch {
                expected: self.num_qubits,
                actual: bits.len(),
            });
        }
        let assignment: Vec<(Var, bool)> = bits
            .iter()
            .enumerate()
            .map(|(i, &bit)| (Var::new(i), bit))
            .collect();

        let mut values = [0.0f64; 4];
        let half = i64::from(self.k.div_euclid(2));
        for (slot, which) in values.iter_mut().zip(Coefficient::ALL) {
            let digits = self.restricted(which, &assignment);
            *slot = ldexp(&digits_value(&digits), -half);
        }
        let [a, b, c, d] = values;

        // ω = (1+i)/√2, ω² = i, ω³ = (-1+i)/√2
        let mut re = d + (c - a) * FRAC_1_SQRT_2;
        let mut im = b + (c + a) * FRAC_1_SQRT_2;
        if self.k.rem_euclid(2) == 1 {
            re *= FRAC_1_SQRT_2;
            im *= FRAC_1_SQRT_2;
        }
        Ok(Complex64::new(re, im))
    }

    /// Every amplitude of the register, indexed by basis
    pub fn amplitudes(&mut self) -> Result<Vec<Complex64>> {
        if self.num_qubits > MAX_ENUMERABLE_QUBITS {
            return Err(StateError::TooManyQubits {
                num_qubits: self.num_qubits,
                limit: MAX_ENUMERABLE_QUBITS,
            });
        }
        (0..1u64 << self.num_qubits)
            .map(|basis| self.get_amplitude(basis))
            .collect()
    }

    /// Squared norm of the whole state
    pub fn total_probability(&mut self) -> Result<f64> {
        self.get_prob(&[], &[])
    }

    /// Drop the lowest digit when it is zero in all four vectors
    pub(crate) fn simplify_tail(&mut self) {
        if self.precision() > 1 && self.vectors().iter().all(|v| v[0].is_false()) {
            for v in [&mut self.a, &mut self.b, &mut self.c, &mut self.d] {
                v.remove(0);
            }
            self.k -= 2;
        }
    }

    /// Drop the top digit when it repeats the one below in all four vectors
    pub(crate) fn simplify_overflow(&mut self) {
        let r = self.precision();
        if r >= 2 && self.vectors().iter().all(|v| v[r - 1] == v[r - 2]) {
            for v in [&mut self.a, &mut self.b, &mut self.c, &mut self.d] {
                v.pop();
            }
        }
    }

    pub(crate) fn vectors(&self) -> [&Vec<Bdd>; 4] {
        [&self.a, &self.b, &self.c, &self.d]
    }

    /// Apply `f` to every digit of every vector
    pub(crate) fn map_digits(&mut self, mut f: impl FnMut(&mut BddManager, Bdd) -> Bdd) {
        for v in [&mut self.a, &mut self.b, &mut self.c, &mut self.d] {
            for x in v.iter_mut() {
                *x = f(&mut self.manager, *x);
            }
        }
    }

    /// Replace every vector with `f` of itself
    pub(crate) fn map_vectors(&mut self, mut f: impl FnMut(&mut BddManager, &[Bdd]) -> Vec<Bdd>) {
        for v in [&mut self.a, &mut self.b, &mut self.c, &mut self.d] {
            let next = f(&mut self.manager, v.as_slice());
            *v = next;
        }
    }

    /// Digits of one vector restricted by `assignment`
    pub(crate) fn restricted(&mut self, which: Coefficient, assignment: &[(Var, bool)]) -> Vec<Bdd> {
        let digits = match which {
            Coefficient::A => &self.a,
            Coefficient::B => &self.b,
            Coefficient::C => &self.c,
            Coefficient::D => &self.d,
        };
        digits
            .iter()
            .map(|&f| self.manager.restrict(f, assignment))
            .collect()
    }

    #[inline]
    pub(crate) fn qubit(&self, index: usize) -> Var {
        Var::new(index)
    }

    /// Reject out-of-range or repeated qubit indices
    pub(crate) fn check_qubits(&self, qubits: &[usize]) -> Result<()> {
        let mut seen: SmallVec<[usize; 4]> = SmallVec::new();
        for &q in qubits {
            if q >= self.num_qubits {
                return Err(StateError::invalid_qubit(q, self.num_qubits));
            }
            if seen.contains(&q) {
                return Err(StateError::DuplicateQubit(q));
            }
            seen.push(q);
        }
        Ok(())
    }
}

/// Bit of qubit `i` in a big-endian basis index
#[inline]
pub(crate) fn basis_bit(basis: u64, num_qubits: usize, i: usize) -> bool {
    let shift = num_qubits - 1 - i;
    shift < 64 && (basis >> shift) & 1 == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_precision_must_hold_a_sign() {
        assert!(matches!(
            CombState::new(2, 1),
            Err(StateError::InsufficientPrecision { digits: 1 })
        ));
    }

    #[test]
    fn test_basis_state_amplitudes() {
        let mut state = CombState::new(3, 8).unwrap();
        state.init_basis_state(6).unwrap();
        for basis in 0..8 {
            let amp = state.get_amplitude(basis).unwrap();
            let expected = if basis == 6 { 1.0 } else { 0.0 };
            assert_relative_eq!(amp.re, expected);
            assert_relative_eq!(amp.im, 0.0);
        }
    }

    #[test]
    fn test_basis_out_of_range() {
        let mut state = CombState::new(2, 4).unwrap();
        assert_eq!(
            state.init_basis_state(4),
            Err(StateError::BasisOutOfRange {
                basis: 4,
                num_qubits: 2
            })
        );
    }

    #[test]
    fn test_sign_extend_keeps_amplitudes() {
        let mut state = CombState::zero_state(2, 4).unwrap();
        state.sign_extend(9);
        assert_eq!(state.precision(), 9);
        assert_relative_eq!(state.get_amplitude(0).unwrap().re, 1.0);
    }

    /// No all-zero lowest digit and no duplicated sign digit above two digits
    fn assert_canonical(state: &CombState) {
        let r = state.precision();
        let vectors = state.vectors();
        assert!(vectors.iter().any(|v| !v[0].is_false()), "lowest digit is zero everywhere");
        assert!(
            r == 2 || vectors.iter().any(|v| v[r - 1] != v[r - 2]),
            "redundant sign digit at r = {r}"
        );
    }

    #[test]
    fn test_hadamard_pair_returns_to_minimal_form() {
        let mut state = CombState::zero_state(1, 2).unwrap();
        state.h(0).unwrap();
        assert_eq!((state.k(), state.precision()), (1, 2));
        assert_canonical(&state);

        state.h(0).unwrap();
        assert_eq!((state.k(), state.precision()), (0, 2));
        assert_canonical(&state);
        assert_relative_eq!(state.get_amplitude(0).unwrap().re, 1.0);
        assert_eq!(state.get_amplitude(1).unwrap().norm(), 0.0);
    }

    #[test]
    fn test_t_cycle_restores_precision() {
        let mut state = CombState::zero_state(1, 2).unwrap();
        state.h(0).unwrap();
        let (k, r) = (state.k(), state.precision());
        let before = state.amplitudes().unwrap();

        for _ in 0..8 {
            state.t(0).unwrap();
            assert_eq!(state.precision(), r);
            assert_canonical(&state);
        }
        assert_eq!((state.k(), state.precision()), (k, r));
        for (got, want) in state.amplitudes().unwrap().iter().zip(&before) {
            assert_relative_eq!(got.re, want.re, epsilon = 1e-12);
            assert_relative_eq!(got.im, want.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_permutations_keep_precision() {
        let mut state = CombState::zero_state(3, 2).unwrap();
        state.h(0).unwrap();
        for _ in 0..20 {
            state.x(1).unwrap();
            state.cwalk(0, &[1, 2]).unwrap();
            assert_eq!((state.k(), state.precision()), (1, 2));
        }
        assert_canonical(&state);
        assert_relative_eq!(state.total_probability().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gate_set_preserves_norm() {
        let mut state = CombState::zero_state(3, 2).unwrap();
        state.h(0).unwrap();
        state.t(0).unwrap();
        state.cnot(0, 1).unwrap();
        state.s(1).unwrap();
        state.y(2).unwrap();
        state.x2p(2).unwrap();
        state.y2p(1).unwrap();
        state.cz(0, 2).unwrap();
        state.tdg(1).unwrap();
        state.sdg(0).unwrap();
        state.swap(0, 2).unwrap();
        state.toffoli(0, 1, 2).unwrap();
        state.fredkin(2, 0, 1).unwrap();
        state.z(1).unwrap();
        state.x(0).unwrap();
        state.cwalk(0, &[1, 2]).unwrap();
        state.h(2).unwrap();

        let total: f64 = state.amplitudes().unwrap().iter().map(|a| a.norm_sqr()).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        assert_relative_eq!(state.total_probability().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_total_probability() {
        let mut empty = CombState::new(2, 4).unwrap();
        assert_eq!(empty.total_probability(), Ok(0.0));
        let mut zero = CombState::zero_state(2, 4).unwrap();
        assert_relative_eq!(zero.total_probability().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_check_qubits() {
        let state = CombState::new(3, 4).unwrap();
        assert!(state.check_qubits(&[0, 2]).is_ok());
        assert_eq!(state.check_qubits(&[3]), Err(StateError::invalid_qubit(3, 3)));
        assert_eq!(state.check_qubits(&[1, 1]), Err(StateError::DuplicateQubit(1)));
    }

    #[test]
    fn test_basis_bit_is_big_endian() {
        // |110⟩ = 6
        assert!(basis_bit(6, 3, 0));
        assert!(basis_bit(6, 3, 1));
        assert!(!basis_bit(6, 3, 2));
    }
}
