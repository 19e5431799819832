//! Symbolic full-adder networks over digit vectors
//!
//! A digit vector is a little-endian list of Boolean functions read as a
//! two's-complement integer, the last digit being the sign digit.

use qdyn_bdd::{Bdd, BddManager};

/// Carry of a full adder: `(x & y) | ((x | y) & c)`
pub(crate) fn carry(m: &mut BddManager, x: Bdd, y: Bdd, c: Bdd) -> Bdd {
    let both = m.and(x, y);
    let either = m.or(x, y);
    let propagated = m.and(either, c);
    m.or(both, propagated)
}

/// Sum of a full adder: `x ^ y ^ c`
pub(crate) fn sum(m: &mut BddManager, x: Bdd, y: Bdd, c: Bdd) -> Bdd {
    let partial = m.xor(x, y);
    m.xor(partial, c)
}

/// Ripple-carry addition producing one extra sign-extended digit
///
/// Both operands must have the same length `r >= 1`; the result has `r + 1`
/// digits.
pub(crate) fn ripple_add(m: &mut BddManager, lhs: &[Bdd], rhs: &[Bdd], carry_in: Bdd) -> Vec<Bdd> {
    debug_assert_eq!(lhs.len(), rhs.len());
    debug_assert!(!lhs.is_empty());

    let r = lhs.len();
    let mut out = Vec::with_capacity(r + 1);
    let mut c = carry_in;
    for (&x, &y) in lhs.iter().zip(rhs) {
        let s = sum(m, x, y, c);
        c = carry(m, x, y, c);
        out.push(s);
    }
    out.push(sum(m, lhs[r - 1], rhs[r - 1], c));
    out
}

/// Add a single carry bit to a digit vector, producing `r + 1` digits
pub(crate) fn increment(m: &mut BddManager, digits: &[Bdd], carry_in: Bdd) -> Vec<Bdd> {
    let zeros = vec![Bdd::FALSE; digits.len()];
    ripple_add(m, digits, &zeros, carry_in)
}

/// Append a copy of the sign digit
pub(crate) fn sign_extended(mut digits: Vec<Bdd>) -> Vec<Bdd> {
    if let Some(&top) = digits.last() {
        digits.push(top);
    }
    digits
}
